use erased_containers::ByteArray;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, [u8; 3]),
    Append(Vec<[u8; 3]>),
    Remove(usize),
    Set(usize, [u8; 3]),
    Reserve(usize),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..64, any::<[u8; 3]>()).prop_map(|(i, v)| Op::Insert(i, v)),
        2 => proptest::collection::vec(any::<[u8; 3]>(), 0..10).prop_map(Op::Append),
        3 => (0usize..64).prop_map(Op::Remove),
        2 => (0usize..64, any::<[u8; 3]>()).prop_map(|(i, v)| Op::Set(i, v)),
        1 => (0usize..200).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
    ]
}

// Model ByteArray as a Vec of fixed-width records. Out-of-range indices
// must fail without changing contents.
proptest! {
    #[test]
    fn prop_byte_array_matches_vec(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let mut sut = ByteArray::with_width(3).unwrap();
        let mut model: Vec<[u8; 3]> = Vec::new();

        for op in ops {
            let cap_before = sut.capacity();
            match op {
                Op::Insert(i, v) => {
                    let res = sut.insert(i, &v);
                    if i <= model.len() {
                        prop_assert!(res.is_ok());
                        model.insert(i, v);
                    } else {
                        prop_assert!(res.is_err());
                    }
                }
                Op::Append(vs) => {
                    let packed: Vec<u8> = vs.iter().flatten().copied().collect();
                    sut.append_many(&packed).unwrap();
                    model.extend(vs);
                }
                Op::Remove(i) => {
                    let res = sut.remove(i);
                    if i < model.len() {
                        prop_assert!(res.is_ok());
                        model.remove(i);
                    } else {
                        prop_assert!(res.is_err());
                    }
                }
                Op::Set(i, v) => {
                    let res = sut.set(i, &v);
                    if i < model.len() {
                        prop_assert!(res.is_ok());
                        model[i] = v;
                    } else {
                        prop_assert!(res.is_err());
                    }
                }
                Op::Reserve(n) => {
                    sut.reserve(n).unwrap();
                    prop_assert!(sut.capacity() >= n.max(1));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity() >= cap_before, "capacity never shrinks");
            prop_assert!(sut.len() <= sut.capacity());
            let flat: Vec<u8> = model.iter().flatten().copied().collect();
            prop_assert_eq!(sut.as_bytes(), flat.as_slice());
        }
    }
}
