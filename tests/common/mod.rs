//! Shared test doubles for the driver and DDL collaborators
#![allow(dead_code)]

use cdmloader::{ConnectionConfig, ConnectionManager, DdlClient, Dbms, DriverClient, DriverError};
use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

/// Connection details produced by [`MockDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDetails(pub String);

/// Session produced by [`MockDriver`]
#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle(pub String);

/// Every call the driver double received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CreateDetails {
        dbms: Dbms,
        server: String,
        user: String,
        password: String,
        path_to_driver: String,
    },
    Connect(String),
    ExecuteSql { handle: String, sql: String },
    CopyIn { statement: String, data: String },
    Disconnect(String),
}

pub type CallLog = Rc<RefCell<Vec<DriverCall>>>;

/// Recording driver double
#[derive(Debug, Default)]
pub struct MockDriver {
    pub calls: CallLog,
    pub details_name: String,
    pub handle_name: String,
    pub fail_details: Option<String>,
    pub fail_connect: Option<String>,
    /// Fail any statement containing this text
    pub fail_sql_containing: Option<String>,
    pub fail_disconnect: Option<String>,
    pub copy_rows: u64,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            details_name: "D1".to_string(),
            handle_name: "H1".to_string(),
            copy_rows: 2,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.borrow().clone()
    }

    /// Statements executed through `execute_sql`, in order
    pub fn executed_sql(&self) -> Vec<String> {
        executed_sql(&self.calls)
    }
}

pub fn executed_sql(calls: &CallLog) -> Vec<String> {
    calls
        .borrow()
        .iter()
        .filter_map(|call| match call {
            DriverCall::ExecuteSql { sql, .. } => Some(sql.clone()),
            _ => None,
        })
        .collect()
}

impl DriverClient for MockDriver {
    type Details = MockDetails;
    type Handle = MockHandle;

    fn create_connection_details(
        &self,
        dbms: Dbms,
        server: &str,
        user: &str,
        password: &str,
        path_to_driver: &str,
    ) -> Result<MockDetails, DriverError> {
        self.calls.borrow_mut().push(DriverCall::CreateDetails {
            dbms,
            server: server.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            path_to_driver: path_to_driver.to_string(),
        });
        match &self.fail_details {
            Some(message) => Err(message.clone().into()),
            None => Ok(MockDetails(self.details_name.clone())),
        }
    }

    fn connect(&self, details: &MockDetails) -> Result<MockHandle, DriverError> {
        self.calls
            .borrow_mut()
            .push(DriverCall::Connect(details.0.clone()));
        match &self.fail_connect {
            Some(message) => Err(message.clone().into()),
            None => Ok(MockHandle(self.handle_name.clone())),
        }
    }

    fn execute_sql(&self, handle: &mut MockHandle, sql: &str) -> Result<(), DriverError> {
        self.calls.borrow_mut().push(DriverCall::ExecuteSql {
            handle: handle.0.clone(),
            sql: sql.to_string(),
        });
        match &self.fail_sql_containing {
            Some(pattern) if sql.contains(pattern.as_str()) => {
                Err(format!("server rejected statement near '{pattern}'").into())
            }
            _ => Ok(()),
        }
    }

    fn copy_in(
        &self,
        _handle: &mut MockHandle,
        statement: &str,
        data: &mut dyn Read,
    ) -> Result<u64, DriverError> {
        let mut content = String::new();
        data.read_to_string(&mut content)?;
        self.calls.borrow_mut().push(DriverCall::CopyIn {
            statement: statement.to_string(),
            data: content,
        });
        Ok(self.copy_rows)
    }

    fn disconnect(&self, handle: MockHandle) -> Result<(), DriverError> {
        self.calls
            .borrow_mut()
            .push(DriverCall::Disconnect(handle.0));
        match &self.fail_disconnect {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

/// Arguments one `execute_ddl` call received
pub type DdlCall = (MockDetails, String, String);

/// Recording DDL double
#[derive(Debug, Default)]
pub struct MockDdl {
    pub calls: Rc<RefCell<Vec<DdlCall>>>,
    pub fail: Option<String>,
}

impl MockDdl {
    pub fn calls(&self) -> Vec<DdlCall> {
        self.calls.borrow().clone()
    }
}

impl DdlClient for MockDdl {
    type Details = MockDetails;

    fn execute_ddl(
        &self,
        details: &MockDetails,
        cdm_version: &str,
        cdm_database_schema: &str,
    ) -> Result<(), DriverError> {
        self.calls.borrow_mut().push((
            details.clone(),
            cdm_version.to_string(),
            cdm_database_schema.to_string(),
        ));
        match &self.fail {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

pub type MockManager = ConnectionManager<MockDriver, MockDdl>;

/// Connection parameters used across the tests
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::new(
        Dbms::Postgresql,
        "db.example.org",
        "u",
        "p",
        "cdmdb",
        "/drv/pg.jar",
    )
}

/// Unconnected manager over fresh doubles
pub fn mock_manager() -> MockManager {
    ConnectionManager::new(test_config(), MockDriver::new(), MockDdl::default())
}

/// Manager over `driver` that has already connected
pub fn connected_manager(driver: MockDriver) -> MockManager {
    let mut manager = ConnectionManager::new(test_config(), driver, MockDdl::default());
    manager.connect().expect("mock connect succeeds");
    manager
}
