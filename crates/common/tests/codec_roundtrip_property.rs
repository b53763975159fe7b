// Property tests for the script file codec: round-trip and delimiter count.

use proptest::collection::vec;
use proptest::prelude::*;
use scriptpad_common::script::{parse, serialize, LineEnding, QUERY_DELIMITER};
use scriptpad_common::types::{ScriptConfig, ScriptKind};
use uuid::Uuid;

fn code_char() -> impl Strategy<Value = char> {
    prop_oneof![
        (b'a'..=b'z').prop_map(char::from),
        (b'A'..=b'Z').prop_map(char::from),
        (b'0'..=b'9').prop_map(char::from),
        Just(' '),
        Just('\n'),
        Just('\t'),
        Just('#'),
        Just('{'),
        Just('}'),
        Just(';'),
        Just('"'),
        Just('é'),
        Just('中'),
    ]
}

// The file format trims leading whitespace from code and reserves the
// delimiter line, so neither can appear in a code value that must round-trip.
fn code_string() -> impl Strategy<Value = String> {
    vec(code_char(), 0..200)
        .prop_map(|chars| chars.into_iter().collect::<String>().trim_start().to_string())
        .prop_filter("code must not contain a delimiter line", |code| {
            code.lines().all(|line| line.trim_end_matches('\r') != QUERY_DELIMITER)
        })
}

fn namespace() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,6}(\\.[A-Z][a-z]{0,6}){0,3}"
}

fn config() -> impl Strategy<Value = ScriptConfig> {
    vec(namespace(), 0..6).prop_map(|namespaces| ScriptConfig::new(ScriptKind::Statements, namespaces))
}

fn line_ending() -> impl Strategy<Value = LineEnding> {
    prop_oneof![Just(LineEnding::Lf), Just(LineEnding::CrLf)]
}

proptest! {
    #[test]
    fn parse_inverts_serialize(
        id_bytes in any::<u128>(),
        config in config(),
        code in code_string(),
        line_ending in line_ending(),
    ) {
        let id = Uuid::from_u128(id_bytes);
        let text = serialize(id, &config, &code, line_ending).expect("config should encode");
        let parsed = parse(&text).expect("serialized script should parse");

        prop_assert_eq!(parsed.id, id);
        prop_assert_eq!(parsed.config, config);
        prop_assert_eq!(parsed.code, code);
    }

    #[test]
    fn text_without_exactly_one_delimiter_never_parses(
        code in code_string(),
        extra in 0usize..3,
    ) {
        prop_assume!(extra != 1);
        let mut text = format!("{}\n{{\"kind\":\"Statements\"}}\n", Uuid::new_v4());
        for _ in 0..extra {
            text.push_str(QUERY_DELIMITER);
            text.push('\n');
        }
        text.push_str(&code);
        prop_assert!(parse(&text).is_err());
    }
}

#[test]
fn scenario_file_parses_to_expected_config_and_code() {
    let id = Uuid::new_v4();
    let text = format!(
        "{id}\n{{\"kind\":\"Statements\",\"namespaces\":[\"System.Net\"]}}\n#Query\nConsole.WriteLine(1);"
    );
    let parsed = parse(&text).unwrap();
    assert_eq!(parsed.id, id);
    assert_eq!(parsed.config.namespaces, vec!["System.Net".to_string()]);
    assert_eq!(parsed.code, "Console.WriteLine(1);");
}
