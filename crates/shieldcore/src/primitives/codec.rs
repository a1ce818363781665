//! Canonical byte encoding shared by statements, proofs, parameters and
//! envelopes.
//!
//! Integers are fixed-width big-endian. Scalars use the 32-byte canonical
//! `PrimeField::Repr`; points use the 32-byte compressed `GroupEncoding`.
//! Decoding is strict: non-canonical scalars, off-curve points and trailing
//! bytes are all rejected.

#![expect(clippy::big_endian_bytes, reason = "specified wire format")]

use ff::PrimeField as _;
use pasta_curves::{group::GroupEncoding as _, pallas};

/// Append-only canonical encoder.
#[derive(Debug, Default)]
pub(crate) struct Writer(Vec<u8>);

impl Writer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub(crate) fn u8(&mut self, val: u8) -> &mut Self {
        self.0.push(val);
        self
    }

    pub(crate) fn u32(&mut self, val: u32) -> &mut Self {
        self.0.extend_from_slice(&val.to_be_bytes());
        self
    }

    pub(crate) fn u64(&mut self, val: u64) -> &mut Self {
        self.0.extend_from_slice(&val.to_be_bytes());
        self
    }

    pub(crate) fn bytes(&mut self, val: &[u8]) -> &mut Self {
        self.0.extend_from_slice(val);
        self
    }

    pub(crate) fn scalar(&mut self, val: &pallas::Scalar) -> &mut Self {
        self.bytes(&val.to_repr())
    }

    pub(crate) fn point(&mut self, val: &pallas::Point) -> &mut Self {
        self.bytes(&val.to_bytes())
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Strict cursor over untrusted bytes. Every accessor returns `None` on
/// short or non-canonical input.
#[derive(Debug)]
pub(crate) struct Reader<'bytes> {
    rest: &'bytes [u8],
}

impl<'bytes> Reader<'bytes> {
    pub(crate) const fn new(bytes: &'bytes [u8]) -> Self {
        Self { rest: bytes }
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, tail) = self.rest.split_first_chunk::<N>()?;
        self.rest = tail;
        Some(*head)
    }

    pub(crate) fn take(&mut self, len: usize) -> Option<&'bytes [u8]> {
        let (head, tail) = self.rest.split_at_checked(len)?;
        self.rest = tail;
        Some(head)
    }

    pub(crate) fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(u8::from_be_bytes)
    }

    pub(crate) fn u32(&mut self) -> Option<u32> {
        self.array::<4>().map(u32::from_be_bytes)
    }

    pub(crate) fn u64(&mut self) -> Option<u64> {
        self.array::<8>().map(u64::from_be_bytes)
    }

    pub(crate) fn scalar(&mut self) -> Option<pallas::Scalar> {
        let repr = self.array::<32>()?;
        Option::from(pallas::Scalar::from_repr(repr))
    }

    pub(crate) fn point(&mut self) -> Option<pallas::Point> {
        let repr = self.array::<32>()?;
        Option::from(pallas::Point::from_bytes(&repr))
    }

    /// Succeeds only when every byte has been consumed.
    pub(crate) const fn finish(&self) -> Option<()> {
        if self.rest.is_empty() { Some(()) } else { None }
    }
}
