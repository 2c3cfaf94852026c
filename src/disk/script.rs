//! The disk-placement script engine: parses the newline-separated CSV
//! grammar from the spec (`# comment` lines, blank lines ignored, fields
//! trimmed) and drives inserts against a [`super::DiskImage`].

use crate::error::DiskError;

use super::{DiskImage, Insert};

/// One parsed placement record, still needing `source_offset`/`length` data
/// sliced out of the object file by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRecord {
    Rwts16 { source_offset: usize, length: usize, track: u8, sector: u8 },
    Rw18 { source_offset: usize, length: usize, side: u8, track: u8, offset: usize },
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn field<T: std::str::FromStr>(fields: &[&str], index: usize, record: &str) -> Result<T, DiskError> {
    fields
        .get(index)
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| DiskError::MalformedRecord(record.to_string()))
}

/// Parses every non-blank, non-comment-only line of `script_text` into a
/// [`ScriptRecord`].
pub fn parse(script_text: &str) -> Result<Vec<ScriptRecord>, DiskError> {
    let mut records = Vec::new();
    for raw_line in script_text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
        let kind = fields[0].to_ascii_uppercase();
        let record = match kind.as_str() {
            "RWTS16" => ScriptRecord::Rwts16 {
                source_offset: field(&fields, 1, line)?,
                length: field(&fields, 2, line)?,
                track: field(&fields, 3, line)?,
                sector: field(&fields, 4, line)?,
            },
            "RW18" => ScriptRecord::Rw18 {
                source_offset: field(&fields, 1, line)?,
                length: field(&fields, 2, line)?,
                side: field(&fields, 3, line)?,
                track: field(&fields, 4, line)?,
                offset: field(&fields, 5, line)?,
            },
            other => return Err(DiskError::UnknownRecordKind(other.to_string())),
        };
        records.push(record);
    }
    Ok(records)
}

/// Runs every parsed record against `image`, reading source bytes out of
/// `object`.
pub fn run(image: &mut DiskImage, script_text: &str, object: &[u8]) -> Result<(), DiskError> {
    for record in parse(script_text)? {
        let (source_offset, length) = match record {
            ScriptRecord::Rwts16 { source_offset, length, .. } => (source_offset, length),
            ScriptRecord::Rw18 { source_offset, length, .. } => (source_offset, length),
        };
        let data = object
            .get(source_offset..source_offset + length)
            .ok_or_else(|| DiskError::MalformedRecord(format!("source range {source_offset}..{} exceeds object file", source_offset + length)))?;
        let insert = match record {
            ScriptRecord::Rwts16 { track, sector, .. } => Insert { source_offset, length, track, sector, side: 0, offset: 0 },
            ScriptRecord::Rw18 { side, track, offset, .. } => Insert { source_offset, length, track, sector: 0, side, offset },
        };
        image.insert(data, &insert)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rwts16_record() {
        let records = parse("RWTS16,0,256,0,0\n").unwrap();
        assert_eq!(records, vec![ScriptRecord::Rwts16 { source_offset: 0, length: 256, track: 0, sector: 0 }]);
    }

    #[test]
    fn parses_rw18_record() {
        let records = parse("RW18,256,512,1,2,0\n").unwrap();
        assert_eq!(records, vec![ScriptRecord::Rw18 { source_offset: 256, length: 512, side: 1, track: 2, offset: 0 }]);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let records = parse("# a comment\n\n  \nRWTS16,0,256,0,0  # trailing comment\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn whitespace_around_fields_is_trimmed() {
        let records = parse(" RWTS16 , 0 , 256 , 1 , 2 \n").unwrap();
        assert_eq!(records, vec![ScriptRecord::Rwts16 { source_offset: 0, length: 256, track: 1, sector: 2 }]);
    }

    #[test]
    fn unknown_record_kind_errors() {
        assert!(matches!(parse("BOGUS,0,0,0,0\n"), Err(DiskError::UnknownRecordKind(_))));
    }

    #[test]
    fn malformed_field_errors() {
        assert!(matches!(parse("RWTS16,not-a-number,256,0,0\n"), Err(DiskError::MalformedRecord(_))));
    }

    #[test]
    fn run_places_object_bytes_into_the_image() {
        let mut image = DiskImage::new_rwts16();
        let object = vec![0xABu8; 256];
        run(&mut image, "RWTS16,0,256,0,0\n", &object).unwrap();
        assert!(image.image()[550..550 + 343].iter().all(|&b| b != 0x96));
    }
}
