/// The table an entity maps to.
///
/// Camel case becomes snake case (`UserGroup` -> `user_group`); a name made
/// only of uppercase ASCII letters is lowercased as a whole (`NVP` -> `nvp`).
pub fn table_name(entity_name: &str) -> String {
    if !entity_name.is_empty() && entity_name.bytes().all(|b| b.is_ascii_uppercase()) {
        return entity_name.to_lowercase();
    }

    let mut snake = String::with_capacity(entity_name.len() + 4);
    for c in entity_name.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.extend(c.to_lowercase());
        }
    }
    match snake.strip_prefix('_') {
        Some(stripped) => stripped.to_owned(),
        None => snake,
    }
}

/// The foreign-key column an owning relationship stores its reference in
pub fn foreign_key_column(name: &str) -> String {
    format!("{name}Id")
}

/// Strips the `Id`/`ID` relation suffix off a column name
pub fn relation_property_name(column_name: &str) -> Option<&str> {
    column_name
        .strip_suffix("Id")
        .or_else(|| column_name.strip_suffix("ID"))
}
