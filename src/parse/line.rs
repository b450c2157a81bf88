/// Split one physical CSV line into fields, honouring quoted fields that
/// may contain commas and doubled-quote escapes. Newlines never reach this
/// function; logical-row reconstruction happens in the caller.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let bytes = line.as_bytes();
    let mut i = 0;
    while i < line.len() {
        // Field boundaries and quote state are driven by ASCII bytes only,
        // so byte indexing is safe; multi-byte chars fall through to the
        // copy branch untouched.
        match bytes[i] {
            b'"' => {
                if in_quotes && bytes.get(i + 1) == Some(&b'"') {
                    // Doubled quote inside a quoted field is a literal quote.
                    current.push('"');
                    i += 2;
                    continue;
                }
                in_quotes = !in_quotes;
                i += 1;
            }
            b',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
                i += 1;
            }
            _ => {
                let ch = line[i..].chars().next().unwrap();
                current.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Trim whitespace + strip one pair of outer quotes if present.
pub fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}
