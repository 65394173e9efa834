#![allow(missing_docs)]

use std::collections::HashMap;

use graphcode::{Decoder, Encoder, Graphcode, GraphcodeError, GraphObject};

#[derive(GraphObject, Default, Debug, Clone, PartialEq)]
struct Point {
    x: i16,
    y: Option<i16>,
}

#[derive(GraphObject, Default, Debug, Clone, PartialEq)]
struct Member {
    name: String,
    score: f64,
    nickname: Option<String>,
}

#[derive(GraphObject, Default, Debug, Clone, PartialEq)]
struct Team {
    name: String,
    captain: Option<Member>,
    members: Vec<Member>,
    tags: Vec<Option<String>>,
    ratings: HashMap<String, u32>,
}

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Character {
    #[graphcode(rename = "hp")]
    health: u32,
    #[graphcode(skip)]
    cached_label: String,
    r#type: u8,
}

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Marker;

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Wrapper<T> {
    inner: T,
    tag: String,
}

mod v1 {
    use graphcode::GraphObject;

    #[derive(GraphObject, Default, Debug, PartialEq)]
    pub struct Record {
        pub id: u32,
        pub label: String,
        pub extra: u64,
    }
}

mod v2 {
    use graphcode::GraphObject;

    #[derive(GraphObject, Default, Debug, PartialEq)]
    pub struct Record {
        pub label: String,
        pub id: u32,
        pub added: Option<bool>,
    }
}

/// The schema table of `Point`: `{"x": 1, "y": 2}`.
fn point_table() -> Vec<u8> {
    vec![2, 0, 0, 0, 1, 0, 0, 0, b'x', 1, 1, 0, 0, 0, b'y', 2]
}

fn sample_team() -> Team {
    let member = |name: &str, score: f64, nickname: Option<&str>| Member {
        name: name.to_string(),
        score,
        nickname: nickname.map(str::to_string),
    };
    Team {
        name: "rovers".to_string(),
        captain: Some(member("ida", 9.5, Some("the wall"))),
        members: vec![
            member("ida", 9.5, Some("the wall")),
            member("joel", 7.25, None),
            member("kai", -1.0, None),
        ],
        tags: vec![Some("north".to_string()), None, Some(String::new())],
        ratings: HashMap::from([("attack".to_string(), 7), ("defense".to_string(), 9)]),
    }
}

#[test]
fn test_composite_wire_layout() -> graphcode::Result<()> {
    let bytes = Graphcode::serialize(&Point { x: 1, y: None })?;

    let mut expected = point_table();
    // x: id 1, present, 1i16. y: id 2, absent. Terminator.
    expected.extend_from_slice(&[1, 1, 1, 0, 2, 0, 0]);
    assert_eq!(bytes, expected);

    let back: Point = Graphcode::deserialize(&bytes)?;
    assert_eq!(back, Point { x: 1, y: None });
    Ok(())
}

#[test]
fn test_schema_table_is_emitted_once_per_stream() -> graphcode::Result<()> {
    let first = Point { x: -3, y: Some(4) };
    let second = Point { x: 5, y: None };

    let mut encoder = Encoder::new(Vec::new());
    encoder.encode(&first)?;
    let after_first = encoder.position()?;
    encoder.encode(&second)?;
    assert_eq!(encoder.schema_count(), 1);
    let bytes = encoder.finish()?;

    // The second instance carries only its tagged fields.
    assert_eq!(after_first, (point_table().len() + 9) as u64);
    assert_eq!(bytes.len() as u64, after_first + 7);

    let mut decoder = Decoder::new(bytes.as_slice());
    assert_eq!(decoder.decode::<Point>()?, first);
    assert_eq!(decoder.decode::<Point>()?, second);
    assert_eq!(decoder.schema_count(), 1);
    assert!(decoder.at_end()?);
    Ok(())
}

#[test]
fn test_nested_composites_round_trip() -> graphcode::Result<()> {
    let team = sample_team();

    let mut encoder = Encoder::new(Vec::new());
    encoder.encode(&team)?;
    assert_eq!(encoder.schema_count(), 2);
    let bytes = encoder.finish()?;

    let back: Team = Graphcode::deserialize(&bytes)?;
    assert_eq!(back, team);
    Ok(())
}

#[test]
fn test_null_fields_stay_null() -> graphcode::Result<()> {
    let team = Team {
        name: "empty".to_string(),
        ..Team::default()
    };
    let back: Team = Graphcode::deserialize(&Graphcode::serialize(&team)?)?;
    assert_eq!(back.captain, None);
    assert!(back.members.is_empty());
    assert_eq!(back, team);
    Ok(())
}

#[test]
fn test_rename_and_skip_attributes() -> graphcode::Result<()> {
    assert_eq!(<Character as graphcode::GraphObject>::FIELDS, ["hp", "type"]);
    assert_eq!(<Character as graphcode::GraphObject>::TYPE_NAME, "Character");

    let original = Character {
        health: 80,
        cached_label: "not persisted".to_string(),
        r#type: 3,
    };
    let back: Character = Graphcode::deserialize(&Graphcode::serialize(&original)?)?;
    assert_eq!(back.health, 80);
    assert_eq!(back.r#type, 3);
    assert_eq!(back.cached_label, "");
    Ok(())
}

#[test]
fn test_fieldless_and_generic_objects() -> graphcode::Result<()> {
    // Empty table and a lone terminator.
    assert_eq!(Graphcode::serialize(&Marker)?, [0, 0, 0, 0, 0]);
    assert_eq!(Graphcode::deserialize::<Marker>(&[0, 0, 0, 0, 0])?, Marker);

    let wrapped = Wrapper {
        inner: vec![Point { x: 1, y: Some(2) }],
        tag: "points".to_string(),
    };
    let back: Wrapper<Vec<Point>> = Graphcode::deserialize(&Graphcode::serialize(&wrapped)?)?;
    assert_eq!(back, wrapped);
    Ok(())
}

#[test]
fn test_fields_are_resolved_by_name() -> graphcode::Result<()> {
    let old = v1::Record {
        id: 42,
        label: "answer".to_string(),
        extra: 7,
    };
    let bytes = Graphcode::serialize(&old)?;

    // `extra` (id 3) has no local counterpart: decoding stops with an error.
    match Graphcode::deserialize::<v2::Record>(&bytes) {
        Err(GraphcodeError::UnknownField {
            type_name,
            field_id,
        }) => {
            assert_eq!(type_name, "Record");
            assert_eq!(field_id, 3);
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }

    // Fields missing from the stream keep their default value.
    let new = v2::Record {
        label: "moved".to_string(),
        id: 9,
        added: Some(true),
    };
    let mut bytes = Graphcode::serialize(&new)?;
    let back: v2::Record = Graphcode::deserialize(&bytes)?;
    assert_eq!(back, new);

    // Drop `added` from the table and the fields: count 2, and the last field block.
    bytes[0] = 2;
    let table_len = 4 + (4 + 5 + 1) + (4 + 2 + 1) + (4 + 5 + 1);
    let mut trimmed = bytes[..table_len - (4 + 5 + 1)].to_vec();
    trimmed.extend_from_slice(&bytes[table_len..bytes.len() - 4]);
    trimmed.push(0);
    let back: v1::Record = Graphcode::deserialize(&trimmed)?;
    assert_eq!(back.id, 9);
    assert_eq!(back.label, "moved");
    assert_eq!(back.extra, 0);
    Ok(())
}

#[test]
fn test_unknown_identifier_is_an_error() {
    let mut bytes = point_table();
    bytes.extend_from_slice(&[7, 1, 0, 0, 0]);
    assert!(matches!(
        Graphcode::deserialize::<Point>(&bytes),
        Err(GraphcodeError::UnknownField {
            type_name: "Point",
            field_id: 7
        })
    ));
}

#[test]
fn test_malformed_schema_tables() {
    // Identifier 0 is the terminator.
    let reserved = vec![1, 0, 0, 0, 1, 0, 0, 0, b'x', 0, 0];
    assert!(matches!(
        Graphcode::deserialize::<Point>(&reserved),
        Err(GraphcodeError::Schema(_))
    ));

    let duplicate = vec![2, 0, 0, 0, 1, 0, 0, 0, b'x', 1, 1, 0, 0, 0, b'y', 1, 0];
    assert!(matches!(
        Graphcode::deserialize::<Point>(&duplicate),
        Err(GraphcodeError::Schema(_))
    ));
}

#[test]
fn test_invalid_presence_byte() {
    let mut bytes = point_table();
    bytes.extend_from_slice(&[1, 5, 0, 0, 0]);
    assert!(matches!(
        Graphcode::deserialize::<Point>(&bytes),
        Err(GraphcodeError::MalformedPrimitive(_))
    ));
}

#[test]
fn test_truncated_object_is_not_returned() -> graphcode::Result<()> {
    let bytes = Graphcode::serialize(&sample_team())?;
    for cut in [bytes.len() - 1, bytes.len() / 2, 3] {
        assert!(matches!(
            Graphcode::deserialize::<Team>(&bytes[..cut]),
            Err(GraphcodeError::UnexpectedEndOfStream { .. })
        ));
    }
    Ok(())
}

#[test]
fn test_big_endian_objects() -> graphcode::Result<()> {
    let options = Graphcode::builder().byte_order(graphcode::ByteOrder::Big);
    let team = sample_team();
    let bytes = options.serialize(&team)?;
    assert_eq!(&bytes[..4], [0, 0, 0, 5]);
    assert_eq!(options.deserialize::<Team>(&bytes)?, team);
    Ok(())
}

#[test]
fn test_composites_across_tiny_blocks() -> graphcode::Result<()> {
    let teams = vec![sample_team(), Team::default(), sample_team()];
    let reference = Graphcode::serialize(&teams)?;

    for block_size in [16usize, 17, 29] {
        for pipelined in [true, false] {
            let options = Graphcode::builder()
                .block_size(block_size)
                .pipelined(pipelined);
            let bytes = options.serialize(&teams)?;
            assert_eq!(bytes, reference, "block {block_size}, pipelined {pipelined}");
            let back: Vec<Team> = options.deserialize(&bytes)?;
            assert_eq!(back, teams, "block {block_size}, pipelined {pipelined}");
        }
    }
    Ok(())
}
