pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

// Keeps the last four digits visible, e.g. `******3210`.
pub fn mask_phone(phone: &str) -> String {
    let visible_from = phone.len().saturating_sub(4);
    phone
        .char_indices()
        .map(|(index, c)| if index < visible_from { '*' } else { c })
        .collect()
}
