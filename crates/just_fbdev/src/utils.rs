pub(crate) mod bin_parse {
    #[inline]
    pub fn u32_be(raw: &[u8]) -> Option<(u32, &[u8])> {
        let bytes = raw.get(0..4)?;
        let res = u32::from_be_bytes(bytes.try_into().ok()?);

        Some((res, &raw[4..]))
    }
}
