use crate::error::Result;
use crate::tdms::GroupTable;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::ops::Range;
use std::path::Path;

/// Split `0..row_count` into exactly `segment_count` contiguous ranges:
/// the first `row_count % segment_count` ranges get one extra row. Ranges
/// concatenate back to the original order with no gaps or overlaps; with
/// more segments than rows the tail ranges are empty.
pub fn split_segments(row_count: usize, segment_count: usize) -> Vec<Range<usize>> {
    assert!(segment_count > 0, "segment count must be at least 1");

    let base = row_count / segment_count;
    let extra = row_count % segment_count;

    let mut ranges = Vec::with_capacity(segment_count);
    let mut start = 0;
    for i in 0..segment_count {
        let len = if i < extra { base + 1 } else { base };
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Stream a table to `dest` in `segment_count` incremental writes.
///
/// Segment 0 creates the file and writes the header row plus its data rows;
/// every later segment appends data rows only. Writing incrementally bounds
/// the amount of rendered CSV text held in memory at once; the segment count
/// never changes the bytes produced.
pub fn write_table_chunked(table: &GroupTable, dest: &Path, segment_count: usize) -> Result<()> {
    let segments = split_segments(table.row_count(), segment_count);

    for (i, segment) in segments.into_iter().enumerate() {
        if i == 0 {
            let file = File::create(dest)?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            writer.write_record(table.header())?;
            write_rows(&mut writer, table, segment)?;
            writer.flush()?;
        } else {
            if segment.is_empty() {
                continue;
            }
            let file = OpenOptions::new().append(true).open(dest)?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            write_rows(&mut writer, table, segment)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    table: &GroupTable,
    rows: Range<usize>,
) -> Result<()> {
    for row in rows {
        writer.write_record(table.row(row))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tdms::table::Column;
    use crate::tdms::Value;
    use std::fs;
    use tempfile::TempDir;

    fn table_with_rows(rows: usize) -> GroupTable {
        GroupTable::new(
            "Voltage".to_string(),
            vec![Column {
                name: "ch0".to_string(),
                values: (0..rows).map(|i| Value::F64(i as f64)).collect(),
            }],
        )
    }

    #[test]
    fn test_split_segments_even_division() {
        let ranges = split_segments(10, 5);
        assert_eq!(ranges.len(), 5);
        assert!(ranges.iter().all(|r| r.len() == 2));
        assert_eq!(ranges[0], 0..2);
        assert_eq!(ranges[4], 8..10);
    }

    #[test]
    fn test_split_segments_uneven_division() {
        // 10 rows over 3 segments: first gets the extra row.
        let ranges = split_segments(10, 3);
        assert_eq!(ranges[0], 0..4);
        assert_eq!(ranges[1], 4..7);
        assert_eq!(ranges[2], 7..10);
    }

    #[test]
    fn test_split_segments_more_segments_than_rows() {
        let ranges = split_segments(2, 101);
        assert_eq!(ranges.len(), 101);
        assert_eq!(ranges[0], 0..1);
        assert_eq!(ranges[1], 1..2);
        assert!(ranges[2..].iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_split_segments_cover_without_gaps_or_overlaps() {
        for (rows, parts) in [(0, 1), (1, 101), (250, 101), (1000, 7)] {
            let ranges = split_segments(rows, parts);
            let mut expected_start = 0;
            for range in &ranges {
                assert_eq!(range.start, expected_start);
                expected_start = range.end;
            }
            assert_eq!(expected_start, rows);
        }
    }

    #[test]
    fn test_chunked_write_round_trips_row_order() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.csv");
        let table = table_with_rows(250);

        write_table_chunked(&table, &dest, 101).unwrap();

        let content = fs::read_to_string(&dest).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        // Exactly one header line, then every row in original order.
        assert_eq!(lines.len(), 251);
        assert_eq!(lines[0], ",ch0");
        assert_eq!(lines[1], "0,0");
        assert_eq!(lines[250], "249,249");
        for (i, line) in lines[1..].iter().enumerate() {
            assert!(line.starts_with(&format!("{},", i)));
        }
    }

    #[test]
    fn test_single_segment_matches_many_segments() {
        let temp_dir = TempDir::new().unwrap();
        let one = temp_dir.path().join("one.csv");
        let many = temp_dir.path().join("many.csv");
        let table = table_with_rows(37);

        write_table_chunked(&table, &one, 1).unwrap();
        write_table_chunked(&table, &many, 101).unwrap();

        assert_eq!(fs::read(&one).unwrap(), fs::read(&many).unwrap());
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.csv");
        let table = GroupTable::new(
            "Log".to_string(),
            vec![Column {
                name: "msg".to_string(),
                values: vec![Value::String("a,b".to_string())],
            }],
        );

        write_table_chunked(&table, &dest, 2).unwrap();

        let content = fs::read_to_string(&dest).unwrap();
        assert!(content.contains("\"a,b\""));
    }

    #[test]
    fn test_rewrite_overwrites_stale_output() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.csv");

        write_table_chunked(&table_with_rows(50), &dest, 5).unwrap();
        write_table_chunked(&table_with_rows(3), &dest, 5).unwrap();

        let content = fs::read_to_string(&dest).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
