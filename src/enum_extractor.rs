use crate::error::{Error, Result};
use crate::oracle::{select_group, SourceOracle};
use log::{debug, warn};

/// Collects the literal values of constants typed `type_name` in the unit
/// at `import_path`.
///
/// Literals are returned as written, quotes included. A constant carrying
/// several names or values is skipped with a warning. A unit that cannot be
/// located yields no values.
pub fn extract_enum_values(
    oracle: &dyn SourceOracle,
    import_path: &str,
    type_name: &str,
) -> Result<Vec<String>> {
    let Some(groups) = oracle.load_unit(import_path)? else {
        warn!("Could not locate unit '{}' for enum {}", import_path, type_name);
        return Ok(Vec::new());
    };
    let group = select_group(&groups).ok_or_else(|| Error::NoUsableGroup {
        unit: import_path.to_string(),
    })?;

    let mut values = Vec::new();
    for decl in group.consts.iter().filter(|c| c.type_text == type_name) {
        match (decl.names.as_slice(), decl.values.as_slice()) {
            ([_], [value]) => values.push(value.clone()),
            _ => warn!(
                "Skipping constant group {:?} of type {}: only single name/value constants become enum values",
                decl.names, type_name
            ),
        }
    }

    debug!(
        "Enum {} in '{}' has {} values",
        type_name,
        import_path,
        values.len()
    );
    Ok(values)
}
