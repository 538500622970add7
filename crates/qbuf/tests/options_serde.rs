#![expect(missing_docs)]

#[cfg(feature = "serde")]
mod serde_support {
    use qbuf::{PopOptions, QueueOptions, StructValue, UnderflowPolicy};

    #[test]
    fn options_fill_in_defaults() {
        let options: QueueOptions = serde_json::from_str(r#"{"delimiter": [13, 10]}"#).unwrap();
        assert_eq!(options.delimiter.as_deref(), Some(&b"\r\n"[..]));
        assert_eq!(options.chunk_capacity, qbuf::DEFAULT_CHUNK_CAPACITY);

        let pop: PopOptions = serde_json::from_str(r#"{"underflow": "Clamp"}"#).unwrap();
        assert_eq!(pop, PopOptions::CLAMP);
        assert_eq!(pop.underflow, UnderflowPolicy::Clamp);
    }

    #[test]
    fn struct_values_serialize() {
        let values = vec![StructValue::UInt(1), StructValue::Bool(false)];
        insta::assert_snapshot!(serde_json::to_string(&values).unwrap(), @r#"[{"UInt":1},{"Bool":false}]"#);
    }
}
