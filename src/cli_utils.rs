use anyhow::Result;

/// Read one line from stdin. Returns `None` at end of input.
pub fn readline() -> Result<Option<String>> {
    let mut buffer = String::new();
    let read = std::io::stdin().read_line(&mut buffer)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(buffer))
}
