#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use graphcode::container::{self, Container};
use graphcode::{ContainerKind, Graphcode, GraphcodeError, GraphObject, Sequence, Uuid};

#[derive(GraphObject, Default, Debug, Clone, PartialEq)]
struct Leaf {
    label: String,
    weight: f32,
}

#[derive(GraphObject, Default, Debug, Clone, PartialEq)]
struct Branch {
    id: u32,
    leaves: Vec<Leaf>,
    parent: Option<Box<Branch>>,
}

fn branch(id: u32, leaves: usize) -> Branch {
    Branch {
        id,
        leaves: (0..leaves)
            .map(|i| Leaf {
                label: format!("leaf-{id}-{i}"),
                weight: i as f32 * 0.25,
            })
            .collect(),
        parent: None,
    }
}

#[test]
fn test_lists_of_composites() -> graphcode::Result<()> {
    for len in [0usize, 1, 7] {
        let forest: Vec<Branch> = (0..len as u32)
            .map(|id| Branch {
                parent: (id % 2 == 1).then(|| Box::new(branch(id * 10, 1))),
                ..branch(id, id as usize)
            })
            .collect();
        let bytes = Graphcode::serialize(&forest)?;
        let back: Vec<Branch> = Graphcode::deserialize(&bytes)?;
        assert_eq!(back, forest, "length {len}");
    }
    Ok(())
}

#[test]
fn test_list_shapes_share_one_layout() -> graphcode::Result<()> {
    let from_vec = Graphcode::serialize(&vec![1i32, 2, 3])?;
    assert_eq!(from_vec, [3, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
    assert_eq!(Graphcode::serialize(&[1i32, 2, 3])?, from_vec);
    assert_eq!(Graphcode::serialize(&VecDeque::from([1i32, 2, 3]))?, from_vec);
    assert_eq!(Graphcode::serialize(&Sequence::from(vec![1i32, 2, 3]))?, from_vec);

    let deque: VecDeque<i32> = Graphcode::deserialize(&from_vec)?;
    assert_eq!(deque, [1, 2, 3]);
    let array: [i32; 3] = Graphcode::deserialize(&from_vec)?;
    assert_eq!(array, [1, 2, 3]);
    Ok(())
}

#[test]
fn test_sets_keep_membership() -> graphcode::Result<()> {
    let names: HashSet<String> = ["ash", "birch", "cedar"].map(String::from).into();
    let back: HashSet<String> = Graphcode::deserialize(&Graphcode::serialize(&names)?)?;
    assert_eq!(back, names);

    let ordered: BTreeSet<i64> = [-5, 0, 9].into();
    let back: BTreeSet<i64> = Graphcode::deserialize(&Graphcode::serialize(&ordered)?)?;
    assert_eq!(back, ordered);
    Ok(())
}

#[test]
fn test_duplicate_set_elements_collapse() -> graphcode::Result<()> {
    let bytes = Graphcode::serialize(&vec![3u8, 1, 3, 2, 1])?;
    let set: HashSet<u8> = Graphcode::deserialize(&bytes)?;
    assert_eq!(set, HashSet::from([1, 2, 3]));
    Ok(())
}

#[test]
fn test_maps_round_trip() -> graphcode::Result<()> {
    let scores: HashMap<Uuid, f64> = (1..=4u128)
        .map(|i| (Uuid::from_u128(i), i as f64 / 3.0))
        .collect();
    let back: HashMap<Uuid, f64> = Graphcode::deserialize(&Graphcode::serialize(&scores)?)?;
    assert_eq!(back, scores);

    let index: BTreeMap<u8, Vec<Leaf>> = BTreeMap::from([
        (1, branch(1, 2).leaves),
        (2, Vec::new()),
    ]);
    let back: BTreeMap<u8, Vec<Leaf>> = Graphcode::deserialize(&Graphcode::serialize(&index)?)?;
    assert_eq!(back, index);
    Ok(())
}

#[test]
fn test_map_layout_and_last_duplicate_wins() -> graphcode::Result<()> {
    let single = BTreeMap::from([(7u8, true)]);
    assert_eq!(Graphcode::serialize(&single)?, [1, 0, 0, 0, 7, 1]);

    let pairs = vec![("k".to_string(), 1u32), ("k".to_string(), 2u32)];
    let map: HashMap<String, u32> = Graphcode::deserialize(&Graphcode::serialize(&pairs)?)?;
    assert_eq!(map.len(), 1);
    assert_eq!(map["k"], 2);
    Ok(())
}

#[test]
fn test_array_length_mismatch() -> graphcode::Result<()> {
    let bytes = Graphcode::serialize(&[1u16, 2, 3, 4])?;
    match Graphcode::deserialize::<[u16; 3]>(&bytes) {
        Err(GraphcodeError::ContainerConstruction(msg)) => assert!(msg.contains('3')),
        other => panic!("expected ContainerConstruction, got {other:?}"),
    }

    assert!(matches!(
        container::reconstruct::<[u8; 2]>(vec![1]),
        Err(GraphcodeError::ContainerConstruction(_))
    ));
    assert_eq!(container::reconstruct::<[u8; 2]>(vec![4, 5])?, [4, 5]);
    Ok(())
}

#[test]
fn test_sequence_is_read_once() -> graphcode::Result<()> {
    let bytes = Graphcode::serialize(&vec!["a".to_string(), "b".to_string(), "c".to_string()])?;
    let mut seq: Sequence<String> = Graphcode::deserialize(&bytes)?;
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.next().as_deref(), Some("a"));
    assert_eq!(seq.remaining(), ["b", "c"]);

    // Only what is left gets written back.
    let rest: Vec<String> = Graphcode::deserialize(&Graphcode::serialize(&seq)?)?;
    assert_eq!(rest, ["b", "c"]);
    assert_eq!(seq.by_ref().count(), 2);
    assert_eq!(seq.next(), None);
    Ok(())
}

#[test]
fn test_optional_elements_carry_presence() -> graphcode::Result<()> {
    let values = vec![Some(5u16), None];
    let bytes = Graphcode::serialize(&values)?;
    assert_eq!(bytes, [2, 0, 0, 0, 1, 5, 0, 0]);
    let back: Vec<Option<u16>> = Graphcode::deserialize(&bytes)?;
    assert_eq!(back, values);
    Ok(())
}

#[test]
fn test_negative_count_is_malformed() {
    assert!(matches!(
        Graphcode::deserialize::<Vec<u8>>(&[0xFE, 0xFF, 0xFF, 0xFF]),
        Err(GraphcodeError::MalformedPrimitive(_))
    ));
}

#[test]
fn test_container_kinds() {
    assert_eq!(<Vec<u8> as Container>::KIND, ContainerKind::List);
    assert_eq!(<VecDeque<u8> as Container>::KIND, ContainerKind::List);
    assert_eq!(<HashSet<u8> as Container>::KIND, ContainerKind::Set);
    assert_eq!(<BTreeMap<u8, u8> as Container>::KIND, ContainerKind::Map);
    assert_eq!(<[u8; 4] as Container>::KIND, ContainerKind::Array);
    assert_eq!(<[u8; 4] as Container>::FIXED_LEN, Some(4));
    assert_eq!(<Sequence<u8> as Container>::KIND, ContainerKind::Sequence);
}

#[test]
fn test_large_elements_with_corrupted_count() {
    // Claims a million 4 KiB arrays but carries a single one.
    let mut bytes = 1_000_000i32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&512i32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 512 * 8]);
    assert!(matches!(
        Graphcode::deserialize::<Vec<[u64; 512]>>(&bytes),
        Err(GraphcodeError::UnexpectedEndOfStream { .. })
    ));
}
