//! Generic struct codec driven by per-message field declarations.
//!
//! Every protocol message implements [`WireMessage`] by writing its fields
//! through a [`FieldWriter`] and reading them back through a
//! [`FieldReader`]. The provided `encode`/`decode` methods then give every
//! message type the same tagged-field wire form without per-message
//! boilerplate: one declaration of `(id, type, optional)` per field,
//! expressed as a method call.
//!
//! Optional fields are always emitted, as a zero-length record at their id.
//! Readers accept both forms of absence — a zero-length record and a fully
//! omitted id — as `None`, so a struct can gain optional fields without
//! breaking peers that encode the older shape.

use bytes::{Bytes, BytesMut};

use crate::{
    codec::{
        CodecError,
        Scalar,
        decode_scalar,
        decode_scalar_array,
        decode_str,
        decode_str_array,
        encode_scalar,
        encode_scalar_array,
        encode_str,
        encode_str_array,
    },
    storage::{FieldTable, put_field},
};

/// A struct with a tagged-field wire form and a protocol-wide message id.
pub trait WireMessage: Sized {
    /// Envelope message-type id carried by frames of this message.
    const MESSAGE_ID: u32;

    /// Emit every declared field, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if any field value cannot be encoded.
    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError>;

    /// Read every declared field back from the decoded table.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] for an absent required field, or
    /// the failing field codec's error.
    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError>;

    /// Encode this message body into its tagged-field wire form.
    ///
    /// # Errors
    ///
    /// Returns the first field's encode error; nothing is emitted on
    /// failure.
    fn encode(&self) -> Result<Bytes, CodecError> {
        let mut writer = FieldWriter::default();
        self.write_fields(&mut writer)?;
        Ok(writer.finish())
    }

    /// Decode a message body from its tagged-field wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field scan fails or any declared
    /// field cannot be read.
    fn decode(src: &[u8]) -> Result<Self, CodecError> {
        let table = FieldTable::parse(src)?;
        Self::read_fields(&FieldReader { table })
    }
}

/// A field value with exactly one active variant.
///
/// The wire form is a u16 variant id followed by the variant's payload.
/// Rust enums make "more than one variant set" unrepresentable, so only
/// the undeclared-id case remains a runtime error, surfaced on decode as
/// [`CodecError::UnknownVariant`].
pub trait WireUnion: Sized {
    /// Variant id of the active variant.
    fn variant_id(&self) -> u16;

    /// Encode the active variant's payload.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the payload cannot be encoded.
    fn encode_variant(&self) -> Result<Bytes, CodecError>;

    /// Decode a variant payload under the given variant id.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownVariant`] for an id outside the
    /// declared set, or the variant payload's decode error.
    fn decode_variant(id: u16, payload: &[u8]) -> Result<Self, CodecError>;
}

/// Collects tagged-field records during encode.
///
/// Fields are emitted in call order and ids must be unique within one
/// message.
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: BytesMut,
    seen: Vec<u16>,
}

impl FieldWriter {
    fn field(&mut self, id: u16, payload: &[u8]) -> Result<(), CodecError> {
        if self.seen.contains(&id) {
            return Err(CodecError::DuplicateField { id });
        }
        self.seen.push(id);
        put_field(&mut self.buf, id, payload);
        Ok(())
    }

    fn encoded_field<F>(&mut self, id: u16, encode: F) -> Result<(), CodecError>
    where
        F: FnOnce(&mut BytesMut) -> Result<(), CodecError>,
    {
        let mut payload = BytesMut::new();
        encode(&mut payload)?;
        self.field(id, &payload)
    }

    /// Emit a required scalar field.
    ///
    /// # Errors
    ///
    /// Returns the scalar's validation error or
    /// [`CodecError::DuplicateField`].
    pub fn scalar<T: Scalar>(&mut self, id: u16, value: T) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| encode_scalar(value, buf))
    }

    /// Emit an optional scalar field; `None` becomes a zero-length record.
    ///
    /// # Errors
    ///
    /// Returns the scalar's validation error or
    /// [`CodecError::DuplicateField`].
    pub fn opt_scalar<T: Scalar>(&mut self, id: u16, value: Option<T>) -> Result<(), CodecError> {
        match value {
            Some(value) => self.scalar(id, value),
            None => self.field(id, &[]),
        }
    }

    /// Emit a required string field as raw UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DuplicateField`] if `id` was already written.
    pub fn str(&mut self, id: u16, value: &str) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| {
            encode_str(value, buf);
            Ok(())
        })
    }

    /// Emit an optional string field; `None` becomes a zero-length record.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DuplicateField`] if `id` was already written.
    pub fn opt_str(&mut self, id: u16, value: Option<&str>) -> Result<(), CodecError> {
        match value {
            Some(value) => self.str(id, value),
            None => self.field(id, &[]),
        }
    }

    /// Emit a scalar-array field.
    ///
    /// # Errors
    ///
    /// Returns the first element's validation error or
    /// [`CodecError::DuplicateField`].
    pub fn scalar_array<T: Scalar>(&mut self, id: u16, values: &[T]) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| encode_scalar_array(values, buf))
    }

    /// Emit a string-array field (per-element u32 length prefixes).
    ///
    /// # Errors
    ///
    /// Returns an element's encode error or [`CodecError::DuplicateField`].
    pub fn str_array(&mut self, id: u16, values: &[String]) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| encode_str_array(values, buf))
    }

    /// Emit a nested sub-message field.
    ///
    /// # Errors
    ///
    /// Returns the sub-message's encode error or
    /// [`CodecError::DuplicateField`].
    pub fn nested<M: WireMessage>(&mut self, id: u16, value: &M) -> Result<(), CodecError> {
        let body = value.encode()?;
        self.field(id, &body)
    }

    /// Emit a list of sub-messages as `(u64 element-length, element-bytes)`
    /// pairs.
    ///
    /// Element sizes vary, so the generic scalar-array scheme does not
    /// apply here.
    ///
    /// # Errors
    ///
    /// Returns an element's encode error or [`CodecError::DuplicateField`].
    pub fn nested_array<M: WireMessage>(&mut self, id: u16, values: &[M]) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| {
            for value in values {
                let body = value.encode()?;
                encode_scalar(body.len() as u64, buf)?;
                buf.extend_from_slice(&body);
            }
            Ok(())
        })
    }

    /// Emit a tagged-union field as `(u16 variant-id, variant-payload)`.
    ///
    /// # Errors
    ///
    /// Returns the variant's encode error or
    /// [`CodecError::DuplicateField`].
    pub fn union<U: WireUnion>(&mut self, id: u16, value: &U) -> Result<(), CodecError> {
        self.encoded_field(id, |buf| {
            encode_scalar(value.variant_id(), buf)?;
            let body = value.encode_variant()?;
            buf.extend_from_slice(&body);
            Ok(())
        })
    }

    /// Consume the writer, yielding the concatenated records.
    #[must_use]
    pub fn finish(self) -> Bytes { self.buf.freeze() }
}

/// Typed access to a decoded tagged-field table.
#[derive(Debug)]
pub struct FieldReader<'a> {
    table: FieldTable<'a>,
}

impl FieldReader<'_> {
    fn require(&self, id: u16) -> Result<&[u8], CodecError> {
        self.table.get(id).ok_or(CodecError::MissingField { id })
    }

    /// Read a required scalar field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] or the scalar's decode error.
    pub fn scalar<T: Scalar>(&self, id: u16) -> Result<T, CodecError> {
        decode_scalar(self.require(id)?)
    }

    /// Read an optional scalar field.
    ///
    /// Both a zero-length payload and an entirely absent id read as
    /// `None`, so bodies from peers that predate the field still decode.
    ///
    /// # Errors
    ///
    /// Returns the scalar's decode error.
    pub fn opt_scalar<T: Scalar>(&self, id: u16) -> Result<Option<T>, CodecError> {
        match self.table.get(id) {
            None => Ok(None),
            Some(payload) if payload.is_empty() => Ok(None),
            Some(payload) => decode_scalar(payload).map(Some),
        }
    }

    /// Read a required string field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] or [`CodecError::Utf8`].
    pub fn str(&self, id: u16) -> Result<String, CodecError> { decode_str(self.require(id)?) }

    /// Read an optional string field.
    ///
    /// Both a zero-length payload and an entirely absent id read as
    /// `None`, so bodies from peers that predate the field still decode.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Utf8`] for an invalid payload.
    pub fn opt_str(&self, id: u16) -> Result<Option<String>, CodecError> {
        match self.table.get(id) {
            None => Ok(None),
            Some(payload) if payload.is_empty() => Ok(None),
            Some(payload) => decode_str(payload).map(Some),
        }
    }

    /// Read a scalar-array field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] or an element decode error.
    pub fn scalar_array<T: Scalar>(&self, id: u16) -> Result<Vec<T>, CodecError> {
        decode_scalar_array(self.require(id)?)
    }

    /// Read a string-array field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] or an element decode error.
    pub fn str_array(&self, id: u16) -> Result<Vec<String>, CodecError> {
        decode_str_array(self.require(id)?)
    }

    /// Read a nested sub-message field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] or the sub-message's decode
    /// error.
    pub fn nested<M: WireMessage>(&self, id: u16) -> Result<M, CodecError> {
        M::decode(self.require(id)?)
    }

    /// Read a list of sub-messages written by
    /// [`FieldWriter::nested_array`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`], a truncated-record error if an
    /// element length runs past the payload, or an element's decode error.
    pub fn nested_array<M: WireMessage>(&self, id: u16) -> Result<Vec<M>, CodecError> {
        let payload = self.require(id)?;
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < payload.len() {
            let remaining = &payload[offset..];
            if remaining.len() < u64::WIDTH {
                return Err(CodecError::TruncatedRecord {
                    need: u64::WIDTH,
                    have: remaining.len(),
                });
            }
            let len = decode_scalar::<u64>(&remaining[..u64::WIDTH])?;
            let len = usize::try_from(len).map_err(|_| CodecError::TruncatedRecord {
                need: usize::MAX,
                have: remaining.len() - u64::WIDTH,
            })?;
            let body = &remaining[u64::WIDTH..];
            if body.len() < len {
                return Err(CodecError::TruncatedRecord {
                    need: len,
                    have: body.len(),
                });
            }
            out.push(M::decode(&body[..len])?);
            offset += u64::WIDTH + len;
        }
        Ok(out)
    }

    /// Read a tagged-union field written by [`FieldWriter::union`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`], a truncated-record error if
    /// the payload lacks the variant-id prefix,
    /// [`CodecError::UnknownVariant`] for an undeclared id, or the variant
    /// payload's decode error.
    pub fn union<U: WireUnion>(&self, id: u16) -> Result<U, CodecError> {
        let payload = self.require(id)?;
        if payload.len() < u16::WIDTH {
            return Err(CodecError::TruncatedRecord {
                need: u16::WIDTH,
                have: payload.len(),
            });
        }
        let variant = decode_scalar::<u16>(&payload[..u16::WIDTH])?;
        U::decode_variant(variant, &payload[u16::WIDTH..])
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Probe {
        count: u32,
        label: String,
        note: Option<String>,
        ratio: f64,
        flags: Vec<u16>,
    }

    impl WireMessage for Probe {
        const MESSAGE_ID: u32 = 900;

        fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
            writer.scalar(1, self.count)?;
            writer.str(2, &self.label)?;
            writer.opt_str(3, self.note.as_deref())?;
            writer.scalar(4, self.ratio)?;
            writer.scalar_array(5, &self.flags)
        }

        fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
            Ok(Self {
                count: reader.scalar(1)?,
                label: reader.str(2)?,
                note: reader.opt_str(3)?,
                ratio: reader.scalar(4)?,
                flags: reader.scalar_array(5)?,
            })
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Bundle {
        title: String,
        probes: Vec<Probe>,
    }

    impl WireMessage for Bundle {
        const MESSAGE_ID: u32 = 901;

        fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
            writer.str(1, &self.title)?;
            writer.nested_array(2, &self.probes)
        }

        fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
            Ok(Self {
                title: reader.str(1)?,
                probes: reader.nested_array(2)?,
            })
        }
    }

    fn sample() -> Probe {
        Probe {
            count: 7,
            label: "alpha".into(),
            note: Some("beta".into()),
            ratio: 2.5,
            flags: vec![1, 2, 3],
        }
    }

    #[rstest]
    fn struct_round_trips() {
        let value = sample();
        let bytes = value.encode().expect("encode");
        assert_eq!(Probe::decode(&bytes).expect("decode"), value);
    }

    #[rstest]
    fn reencode_is_byte_identical() {
        let bytes = sample().encode().expect("encode");
        let decoded = Probe::decode(&bytes).expect("decode");
        assert_eq!(decoded.encode().expect("re-encode"), bytes);
    }

    #[rstest]
    fn absent_optional_round_trips() {
        let value = Probe {
            note: None,
            ..sample()
        };
        let bytes = value.encode().expect("encode");
        let decoded = Probe::decode(&bytes).expect("decode");
        assert_eq!(decoded.note, None);
        assert_eq!(decoded, value);
    }

    #[rstest]
    fn omitted_optional_field_decodes_to_none() {
        // An older peer's body: fields 1, 2, 4 and 5 only, id 3 never
        // written at all.
        let mut writer = FieldWriter::default();
        writer.scalar(1u16, 7u32).expect("count");
        writer.str(2, "alpha").expect("label");
        writer.scalar(4u16, 2.5f64).expect("ratio");
        writer.scalar_array(5u16, &[1u16, 2, 3]).expect("flags");
        let decoded = Probe::decode(&writer.finish()).expect("decode");
        assert_eq!(decoded.note, None);
        assert_eq!(decoded.count, 7);
    }

    #[rstest]
    fn missing_required_field_is_an_error() {
        // A body holding only field 1; fields 2..5 never written.
        let mut writer = FieldWriter::default();
        writer.scalar(1u16, 7u32).expect("write");
        let err = Probe::decode(&writer.finish()).expect_err("must fail");
        assert_eq!(err, CodecError::MissingField { id: 2 });
    }

    #[rstest]
    fn unknown_fields_are_skipped() {
        let mut writer = FieldWriter::default();
        sample().write_fields(&mut writer).expect("write");
        writer.str(99, "future").expect("extra field");
        let decoded = Probe::decode(&writer.finish()).expect("decode");
        assert_eq!(decoded, sample());
    }

    #[rstest]
    fn duplicate_field_id_fails_encode() {
        let mut writer = FieldWriter::default();
        writer.scalar(1u16, 1u8).expect("first");
        let err = writer.scalar(1u16, 2u8).expect_err("must fail");
        assert_eq!(err, CodecError::DuplicateField { id: 1 });
    }

    #[rstest]
    fn nested_array_round_trips() {
        let bundle = Bundle {
            title: "set".into(),
            probes: vec![
                sample(),
                Probe {
                    count: 8,
                    note: None,
                    ..sample()
                },
            ],
        };
        let bytes = bundle.encode().expect("encode");
        assert_eq!(Bundle::decode(&bytes).expect("decode"), bundle);
    }

    #[rstest]
    fn empty_nested_array_round_trips() {
        let bundle = Bundle {
            title: "none".into(),
            probes: vec![],
        };
        let bytes = bundle.encode().expect("encode");
        assert_eq!(Bundle::decode(&bytes).expect("decode"), bundle);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Payload {
        Text(String),
        Code(u32),
    }

    impl WireUnion for Payload {
        fn variant_id(&self) -> u16 {
            match self {
                Self::Text(_) => 1,
                Self::Code(_) => 2,
            }
        }

        fn encode_variant(&self) -> Result<Bytes, CodecError> {
            let mut buf = BytesMut::new();
            match self {
                Self::Text(text) => encode_str(text, &mut buf),
                Self::Code(code) => encode_scalar(*code, &mut buf)?,
            }
            Ok(buf.freeze())
        }

        fn decode_variant(id: u16, payload: &[u8]) -> Result<Self, CodecError> {
            match id {
                1 => decode_str(payload).map(Self::Text),
                2 => decode_scalar(payload).map(Self::Code),
                id => Err(CodecError::UnknownVariant { id }),
            }
        }
    }

    #[rstest]
    #[case(Payload::Text("hi".into()))]
    #[case(Payload::Code(404))]
    fn union_field_round_trips(#[case] value: Payload) {
        let mut writer = FieldWriter::default();
        writer.union(1, &value).expect("write");
        let bytes = writer.finish();
        let table = FieldTable::parse(&bytes).expect("parse");
        let reader = FieldReader { table };
        assert_eq!(reader.union::<Payload>(1).expect("read"), value);
    }

    #[rstest]
    fn undeclared_union_variant_is_rejected() {
        let mut writer = FieldWriter::default();
        let mut payload = BytesMut::new();
        encode_scalar(9u16, &mut payload).expect("variant id");
        writer.field(1, &payload).expect("raw field");
        let bytes = writer.finish();
        let table = FieldTable::parse(&bytes).expect("parse");
        let reader = FieldReader { table };
        let err = reader.union::<Payload>(1).expect_err("must fail");
        assert_eq!(err, CodecError::UnknownVariant { id: 9 });
    }

    #[rstest]
    fn truncated_union_prefix_is_rejected() {
        let mut writer = FieldWriter::default();
        writer.field(1, &[1u8]).expect("raw field");
        let bytes = writer.finish();
        let table = FieldTable::parse(&bytes).expect("parse");
        let reader = FieldReader { table };
        let err = reader.union::<Payload>(1).expect_err("must fail");
        assert_eq!(err, CodecError::TruncatedRecord { need: 2, have: 1 });
    }

    #[rstest]
    fn truncated_nested_element_is_rejected() {
        let mut writer = FieldWriter::default();
        writer.str(1, "bad").expect("title");
        // Element length claims 100 bytes; only 1 follows.
        let mut payload = BytesMut::new();
        encode_scalar(100u64, &mut payload).expect("len");
        payload.extend_from_slice(&[0u8]);
        writer.field(2, &payload).expect("raw field");
        let err = Bundle::decode(&writer.finish()).expect_err("must fail");
        assert_eq!(err, CodecError::TruncatedRecord { need: 100, have: 1 });
    }
}
