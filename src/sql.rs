//! SQL script handling for DDL files
//!
//! The OHDSI DDL scripts are written against an `@cdmDatabaseSchema`
//! placeholder and hold many statements per file. [`render_script`] replaces
//! the placeholder and [`split_statements`] cuts the result into statements
//! that can be executed one by one.

/// Placeholder used by the OHDSI DDL scripts for the target schema
pub const SCHEMA_PLACEHOLDER: &str = "@cdmDatabaseSchema";

/// Replace every schema placeholder in `script` with `schema`
#[must_use]
pub fn render_script(script: &str, schema: &str) -> String {
    script.replace(SCHEMA_PLACEHOLDER, schema)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
    DollarQuoted,
}

/// Split a SQL script into statements.
///
/// Statements end at a `;` outside of string literals, quoted identifiers,
/// comments and dollar-quoted bodies. Comments are dropped, the terminating
/// semicolon is not kept and empty statements are skipped.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Code;
    let mut dollar_tag = String::new();
    let chars: Vec<char> = script.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            State::Code => match c {
                '-' if next == Some('-') => {
                    state = State::LineComment;
                    i += 1;
                }
                '/' if next == Some('*') => {
                    state = State::BlockComment;
                    i += 1;
                }
                '\'' | '"' => {
                    state = State::Quoted(c);
                    current.push(c);
                }
                '$' => {
                    if let Some(tag) = dollar_tag_at(&chars[i..]) {
                        current.push_str(&tag);
                        i += tag.chars().count() - 1;
                        dollar_tag = tag;
                        state = State::DollarQuoted;
                    } else {
                        current.push(c);
                    }
                }
                ';' => push_statement(&mut statements, &mut current),
                _ => current.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    current.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    current.push(' ');
                    state = State::Code;
                    i += 1;
                }
            }
            State::Quoted(quote) => {
                current.push(c);
                if c == quote {
                    // doubled quote is an escaped quote
                    if next == Some(quote) {
                        current.push(quote);
                        i += 1;
                    } else {
                        state = State::Code;
                    }
                }
            }
            State::DollarQuoted => {
                if c == '$' && starts_with(&chars[i..], &dollar_tag) {
                    current.push_str(&dollar_tag);
                    i += dollar_tag.chars().count() - 1;
                    state = State::Code;
                } else {
                    current.push(c);
                }
            }
        }
        i += 1;
    }

    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// Dollar-quote opening tag (`$$` or `$name$`) starting at `chars[0]`
fn dollar_tag_at(chars: &[char]) -> Option<String> {
    let mut tag = String::from("$");
    for &c in chars.iter().skip(1) {
        if c == '$' {
            tag.push('$');
            return Some(tag);
        }
        if c.is_alphanumeric() || c == '_' {
            tag.push(c);
        } else {
            return None;
        }
    }
    None
}

fn starts_with(chars: &[char], tag: &str) -> bool {
    let mut remaining = chars.iter();
    tag.chars().all(|t| remaining.next() == Some(&t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_script_replaces_every_placeholder() {
        let script = "CREATE TABLE @cdmDatabaseSchema.person (person_id integer);\n\
                      ALTER TABLE @cdmDatabaseSchema.person ADD CONSTRAINT xpk_person PRIMARY KEY (person_id);";
        let rendered = render_script(script, "cdm");
        assert!(!rendered.contains(SCHEMA_PLACEHOLDER));
        assert_eq!(rendered.matches("cdm.person").count(), 2);
    }

    #[test]
    fn test_split_ddl_with_comments() {
        let script = r"
--postgresql CDM DDL Specification for OMOP Common Data Model 5.4
--HINT DISTRIBUTE ON KEY (person_id)
CREATE TABLE cdm.person (
            person_id integer NOT NULL,
            gender_concept_id integer NOT NULL );
/* block comment; with a semicolon */
CREATE TABLE cdm.concept (
            concept_id integer NOT NULL,
            concept_name varchar(255) NOT NULL );
";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE cdm.person"));
        assert!(statements[1].starts_with("CREATE TABLE cdm.concept"));
        assert!(statements.iter().all(|s| !s.contains("HINT")));
    }

    #[test]
    fn test_semicolons_inside_literals_do_not_split() {
        let script = "INSERT INTO t VALUES ('a;b', 'it''s; fine');\nSELECT \"odd;name\" FROM t;";
        let statements = split_statements(script);
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t VALUES ('a;b', 'it''s; fine')".to_string(),
                "SELECT \"odd;name\" FROM t".to_string(),
            ]
        );
    }

    #[test]
    fn test_dollar_quoted_body_is_one_statement() {
        let script = r"
CREATE FUNCTION f() RETURNS text AS $body$
BEGIN
    RETURN 'x; y';
END;
$body$ LANGUAGE plpgsql; SELECT 1;
";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("END;"));
        assert!(statements[0].ends_with("LANGUAGE plpgsql"));
        assert_eq!(statements[1], "SELECT 1");
    }

    #[test]
    fn test_edge_cases() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("-- only a comment\n/* and another */").is_empty());
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1".to_string()]);
        assert_eq!(split_statements("SELECT $1;"), vec!["SELECT $1".to_string()]);
    }
}
