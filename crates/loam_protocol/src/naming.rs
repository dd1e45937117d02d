//! Column naming for variants and over-long identifiers.

/// Separator between a base column name and its variant suffix.
pub const VARIANT_SEPARATOR: &str = "__v_";

/// Length of the hash tag appended to shortened identifiers.
const HASH_TAG_LEN: usize = 8;

/// Deterministic sibling column name for a variant of `base`.
///
/// `("confidence", "text")` always yields `"confidence__v_text"`. For type
/// names accepted by [`is_valid_variant_type`] the last separator splits the
/// name back into base and type, so distinct pairs never share a name.
pub fn variant_column_name(base: &str, type_name: &str) -> String {
    format!("{}{}{}", base, VARIANT_SEPARATOR, type_name)
}

/// Returns true if the name carries at least one variant suffix.
pub fn is_variant_column(name: &str) -> bool {
    name.contains(VARIANT_SEPARATOR)
}

/// Returns true if `type_name` can follow the separator without making the
/// resulting column name ambiguous.
///
/// The name must be non-empty, contain no separator and not start with `_`
/// (which would let the separator overlap into the type name).
pub fn is_valid_variant_type(type_name: &str) -> bool {
    !type_name.is_empty() && !type_name.starts_with('_') && !is_variant_column(type_name)
}

/// Shorten `name` to at most `max_length` bytes.
///
/// Names that already fit are returned unchanged. Longer names keep a prefix
/// and get a hash tag of the full name, so two different long names do not
/// collapse into the same identifier.
pub fn shorten_identifier(name: &str, max_length: usize) -> String {
    if name.len() <= max_length {
        return name.to_string();
    }

    let hash = blake3::hash(name.as_bytes()).to_hex();
    let tag = &hash[..HASH_TAG_LEN];
    if max_length <= HASH_TAG_LEN + 1 {
        return tag[..max_length.min(HASH_TAG_LEN)].to_string();
    }

    let mut cut = max_length - HASH_TAG_LEN - 1;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &name[..cut], tag)
}

/// Variant name, shortened when a maximum identifier length applies.
pub fn variant_column_name_with_limit(
    base: &str,
    type_name: &str,
    max_length: Option<usize>,
) -> String {
    let name = variant_column_name(base, type_name);
    match max_length {
        Some(max) => shorten_identifier(&name, max),
        None => name,
    }
}
