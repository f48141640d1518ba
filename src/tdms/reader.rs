use crate::error::{BatchError, Result};
use crate::tdms::table::{Column, GroupTable};
use crate::tdms::types::{timestamp_from_raw, ObjectPath, TdsType, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

const LEAD_IN_TAG: &[u8; 4] = b"TDSm";

const TOC_META_DATA: u32 = 1 << 1;
const TOC_NEW_OBJ_LIST: u32 = 1 << 2;
const TOC_RAW_DATA: u32 = 1 << 3;
const TOC_INTERLEAVED_DATA: u32 = 1 << 5;
const TOC_BIG_ENDIAN: u32 = 1 << 6;
const TOC_DAQMX_RAW_DATA: u32 = 1 << 7;

/// A TDMS container, fully materialized.
///
/// `open` reads and decodes every segment eagerly; the file handle is
/// released before it returns. Groups and channels keep their container
/// order (order of first appearance in segment metadata).
#[derive(Debug)]
pub struct TdmsFile {
    groups: Vec<GroupTable>,
}

impl TdmsFile {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new();
        parser.parse(data)?;
        Ok(Self {
            groups: parser.into_group_tables(),
        })
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[GroupTable] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<GroupTable> {
        self.groups
    }
}

/// Raw data index of one channel within a segment.
#[derive(Debug, Clone, Copy)]
struct RawIndex {
    data_type: TdsType,
    num_values: u64,
    /// On-disk byte size of one chunk of this channel, offsets included
    /// for string channels.
    total_bytes: u64,
}

#[derive(Debug)]
struct ChannelData {
    group: String,
    name: String,
    values: Vec<Value>,
    last_index: Option<RawIndex>,
}

struct Parser {
    channels: Vec<ChannelData>,
    channel_lookup: HashMap<(String, String), usize>,
    group_order: Vec<String>,
    group_seen: HashSet<String>,
    /// Channels carrying raw data in the current segment, in layout order.
    active: Vec<usize>,
}

impl Parser {
    fn new() -> Self {
        Self {
            channels: Vec::new(),
            channel_lookup: HashMap::new(),
            group_order: Vec::new(),
            group_seen: HashSet::new(),
            active: Vec::new(),
        }
    }

    fn parse(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(BatchError::InvalidFormat {
                message: "file is empty".to_string(),
            });
        }

        let mut pos = 0usize;
        while pos < data.len() {
            pos = self.parse_segment(data, pos)?;
        }
        Ok(())
    }

    /// Parse one segment starting at `pos`; returns the offset of the next.
    fn parse_segment(&mut self, data: &[u8], pos: usize) -> Result<usize> {
        let mut cursor = Cursor::new(data, pos);

        let tag = cursor.read_exact(4)?;
        if tag != LEAD_IN_TAG {
            return Err(BatchError::InvalidFormat {
                message: format!("bad segment tag at offset {}: {:02X?}", pos, tag),
            });
        }

        let toc = cursor.read_u32()?;
        let _version = cursor.read_u32()?;
        let next_segment_offset = cursor.read_u64()?;
        let raw_data_offset = cursor.read_u64()?;
        let lead_in_end = cursor.pos;

        if toc & TOC_BIG_ENDIAN != 0 {
            return Err(BatchError::Unsupported {
                feature: "big-endian segments".to_string(),
            });
        }
        if toc & TOC_DAQMX_RAW_DATA != 0 {
            return Err(BatchError::Unsupported {
                feature: "DAQmx raw data".to_string(),
            });
        }

        // u64::MAX marks a segment whose writer crashed before patching the
        // lead-in; read whatever complete chunks are present. Both offsets
        // come straight from the file and must not be trusted to add.
        let incomplete = next_segment_offset == u64::MAX;
        let segment_end = if incomplete {
            data.len()
        } else {
            let end = (lead_in_end as u64)
                .checked_add(next_segment_offset)
                .filter(|&end| end <= data.len() as u64)
                .ok_or_else(|| BatchError::InvalidFormat {
                    message: format!("segment at offset {} extends past end of file", pos),
                })?;
            end as usize
        };

        let data_start = (lead_in_end as u64)
            .checked_add(raw_data_offset)
            .filter(|&start| start <= segment_end as u64)
            .ok_or_else(|| BatchError::InvalidFormat {
                message: format!("raw data offset past segment end at offset {}", pos),
            })?;
        let data_start = data_start as usize;

        if toc & TOC_META_DATA != 0 {
            self.parse_metadata(&mut cursor, toc)?;
        }

        if toc & TOC_RAW_DATA != 0 {
            if toc & TOC_INTERLEAVED_DATA != 0 {
                return Err(BatchError::Unsupported {
                    feature: "interleaved raw data".to_string(),
                });
            }
            self.read_raw_data(data, data_start, segment_end, incomplete)?;
        }

        Ok(segment_end)
    }

    fn parse_metadata(&mut self, cursor: &mut Cursor, toc: u32) -> Result<()> {
        let new_obj_list = toc & TOC_NEW_OBJ_LIST != 0;
        if new_obj_list {
            self.active.clear();
        }

        let num_objects = cursor.read_u32()?;
        for _ in 0..num_objects {
            let raw_path = cursor.read_string()?;
            let path = ObjectPath::parse(&raw_path)?;
            let index_header = cursor.read_u32()?;

            match path {
                ObjectPath::Root => {
                    self.expect_no_raw_data(index_header, &raw_path)?;
                    self.skip_properties(cursor)?;
                }
                ObjectPath::Group(name) => {
                    self.expect_no_raw_data(index_header, &raw_path)?;
                    self.register_group(&name);
                    self.skip_properties(cursor)?;
                }
                ObjectPath::Channel { group, channel } => {
                    self.register_group(&group);
                    let channel_idx = self.register_channel(group, channel);

                    match index_header {
                        0xFFFF_FFFF => {
                            // Channel present with no raw data this segment.
                            // It may still be active from an earlier segment
                            // when the object list is kept; drop it so raw
                            // data is not misattributed.
                            self.deactivate(channel_idx);
                        }
                        0x0000_0000 => {
                            // Same layout as this channel's previous segment.
                            if self.channels[channel_idx].last_index.is_none() {
                                return Err(BatchError::InvalidFormat {
                                    message: format!(
                                        "channel {:?} reuses an index before defining one",
                                        raw_path
                                    ),
                                });
                            }
                            self.activate(channel_idx);
                        }
                        0x6912_0000 | 0x6913_0000 => {
                            return Err(BatchError::Unsupported {
                                feature: "DAQmx raw data index".to_string(),
                            });
                        }
                        _ => {
                            let index = Self::read_raw_index(cursor)?;
                            self.channels[channel_idx].last_index = Some(index);
                            self.activate(channel_idx);
                        }
                    }

                    self.skip_properties(cursor)?;
                }
            }
        }

        Ok(())
    }

    fn expect_no_raw_data(&self, index_header: u32, raw_path: &str) -> Result<()> {
        if index_header != 0xFFFF_FFFF {
            return Err(BatchError::InvalidFormat {
                message: format!("non-channel object {:?} declares raw data", raw_path),
            });
        }
        Ok(())
    }

    fn read_raw_index(cursor: &mut Cursor) -> Result<RawIndex> {
        let data_type = TdsType::from_code(cursor.read_u32()?)?;
        let array_dimension = cursor.read_u32()?;
        if array_dimension != 1 {
            return Err(BatchError::Unsupported {
                feature: format!("array dimension {}", array_dimension),
            });
        }
        let num_values = cursor.read_u64()?;

        let total_bytes = match data_type.fixed_size() {
            Some(size) => num_values
                .checked_mul(size as u64)
                .ok_or_else(|| BatchError::InvalidFormat {
                    message: "channel value count overflows".to_string(),
                })?,
            None => cursor.read_u64()?,
        };

        Ok(RawIndex {
            data_type,
            num_values,
            total_bytes,
        })
    }

    fn skip_properties(&self, cursor: &mut Cursor) -> Result<()> {
        let num_properties = cursor.read_u32()?;
        for _ in 0..num_properties {
            let _name = cursor.read_string()?;
            let data_type = TdsType::from_code(cursor.read_u32()?)?;
            match data_type {
                TdsType::Void => {}
                TdsType::String => {
                    let _value = cursor.read_string()?;
                }
                other => {
                    let size = other.fixed_size().unwrap_or(0);
                    cursor.read_exact(size)?;
                }
            }
        }
        Ok(())
    }

    fn read_raw_data(
        &mut self,
        data: &[u8],
        data_start: usize,
        segment_end: usize,
        incomplete: bool,
    ) -> Result<()> {
        // String channel byte sizes are file-controlled; sum with care.
        let mut chunk_size: u64 = 0;
        for &idx in &self.active {
            if let Some(index) = self.channels[idx].last_index {
                chunk_size = chunk_size.checked_add(index.total_bytes).ok_or_else(|| {
                    BatchError::InvalidFormat {
                        message: "segment chunk size overflows".to_string(),
                    }
                })?;
            }
        }

        if chunk_size == 0 {
            return Ok(());
        }

        let available = (segment_end - data_start) as u64;
        let num_chunks = available / chunk_size;
        if num_chunks == 0 && !incomplete {
            return Err(BatchError::InvalidFormat {
                message: "segment raw data shorter than one chunk".to_string(),
            });
        }

        let mut cursor = Cursor::new(data, data_start);
        for _ in 0..num_chunks {
            for position in 0..self.active.len() {
                let channel_idx = self.active[position];
                let index = match self.channels[channel_idx].last_index {
                    Some(index) => index,
                    None => continue,
                };
                let values = Self::read_channel_values(&mut cursor, index)?;
                self.channels[channel_idx].values.extend(values);
            }
        }

        Ok(())
    }

    fn read_channel_values(cursor: &mut Cursor, index: RawIndex) -> Result<Vec<Value>> {
        let count = index.num_values as usize;
        let mut values = Vec::with_capacity(count);

        match index.data_type {
            TdsType::String => {
                let block = cursor.read_exact(index.total_bytes as usize)?;
                let offsets_len = count
                    .checked_mul(4)
                    .filter(|&len| len <= block.len())
                    .ok_or_else(|| BatchError::InvalidFormat {
                        message: "string channel offsets exceed raw size".to_string(),
                    })?;
                let string_data = &block[offsets_len..];

                let mut start = 0usize;
                for i in 0..count {
                    let off_bytes = &block[i * 4..i * 4 + 4];
                    let end = u32::from_le_bytes(off_bytes.try_into().unwrap()) as usize;
                    if end < start || end > string_data.len() {
                        return Err(BatchError::InvalidFormat {
                            message: "string channel offsets out of order".to_string(),
                        });
                    }
                    let text = String::from_utf8_lossy(&string_data[start..end]).into_owned();
                    values.push(Value::String(text));
                    start = end;
                }
            }
            TdsType::Void => {
                return Err(BatchError::Unsupported {
                    feature: "void channel data".to_string(),
                });
            }
            scalar => {
                for _ in 0..count {
                    values.push(Self::read_scalar(cursor, scalar)?);
                }
            }
        }

        Ok(values)
    }

    fn read_scalar(cursor: &mut Cursor, data_type: TdsType) -> Result<Value> {
        Ok(match data_type {
            TdsType::I8 => Value::I8(cursor.read_exact(1)?[0] as i8),
            TdsType::I16 => Value::I16(i16::from_le_bytes(cursor.read_array()?)),
            TdsType::I32 => Value::I32(i32::from_le_bytes(cursor.read_array()?)),
            TdsType::I64 => Value::I64(i64::from_le_bytes(cursor.read_array()?)),
            TdsType::U8 => Value::U8(cursor.read_exact(1)?[0]),
            TdsType::U16 => Value::U16(u16::from_le_bytes(cursor.read_array()?)),
            TdsType::U32 => Value::U32(cursor.read_u32()?),
            TdsType::U64 => Value::U64(cursor.read_u64()?),
            TdsType::F32 => Value::F32(f32::from_le_bytes(cursor.read_array()?)),
            TdsType::F64 => Value::F64(f64::from_le_bytes(cursor.read_array()?)),
            TdsType::Boolean => Value::Bool(cursor.read_exact(1)?[0] != 0),
            TdsType::Timestamp => {
                let fractions = cursor.read_u64()?;
                let seconds = i64::from_le_bytes(cursor.read_array()?);
                Value::Timestamp(timestamp_from_raw(seconds, fractions)?)
            }
            TdsType::Void | TdsType::String => {
                return Err(BatchError::InvalidFormat {
                    message: "scalar read of non-scalar type".to_string(),
                });
            }
        })
    }

    fn register_group(&mut self, name: &str) {
        if self.group_seen.insert(name.to_string()) {
            self.group_order.push(name.to_string());
        }
    }

    fn register_channel(&mut self, group: String, channel: String) -> usize {
        let key = (group.clone(), channel.clone());
        if let Some(&idx) = self.channel_lookup.get(&key) {
            return idx;
        }
        let idx = self.channels.len();
        self.channels.push(ChannelData {
            group,
            name: channel,
            values: Vec::new(),
            last_index: None,
        });
        self.channel_lookup.insert(key, idx);
        idx
    }

    fn activate(&mut self, channel_idx: usize) {
        if !self.active.contains(&channel_idx) {
            self.active.push(channel_idx);
        }
    }

    fn deactivate(&mut self, channel_idx: usize) {
        self.active.retain(|&idx| idx != channel_idx);
    }

    fn into_group_tables(self) -> Vec<GroupTable> {
        let mut columns_by_group: HashMap<String, Vec<Column>> = HashMap::new();
        for channel in self.channels {
            columns_by_group
                .entry(channel.group)
                .or_default()
                .push(Column {
                    name: channel.name,
                    values: channel.values,
                });
        }

        self.group_order
            .into_iter()
            .map(|name| {
                let columns = columns_by_group.remove(&name).unwrap_or_default();
                GroupTable::new(name, columns)
            })
            .collect()
    }
}

/// Bounds-checked little-endian reads over the file image.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| BatchError::InvalidFormat {
                message: format!("unexpected end of file at offset {}", self.pos),
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        Ok(self.read_exact(N)?.try_into().unwrap())
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_exact(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tdms::types::Value;

    // Minimal segment builder mirroring the on-disk layout.
    struct SegmentBuilder {
        toc: u32,
        meta: Vec<u8>,
        raw: Vec<u8>,
        num_objects: u32,
    }

    impl SegmentBuilder {
        fn new() -> Self {
            Self {
                toc: TOC_META_DATA | TOC_NEW_OBJ_LIST,
                meta: Vec::new(),
                raw: Vec::new(),
                num_objects: 0,
            }
        }

        fn push_string(buf: &mut Vec<u8>, s: &str) {
            buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }

        fn group(mut self, name: &str) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'", name));
            self.meta.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            self.meta.extend_from_slice(&0u32.to_le_bytes()); // no properties
            self.num_objects += 1;
            self
        }

        fn f64_channel(mut self, group: &str, name: &str, values: &[f64]) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'/'{}'", group, name));
            self.meta.extend_from_slice(&20u32.to_le_bytes()); // index length
            self.meta.extend_from_slice(&0x0Au32.to_le_bytes()); // f64
            self.meta.extend_from_slice(&1u32.to_le_bytes()); // dimension
            self.meta
                .extend_from_slice(&(values.len() as u64).to_le_bytes());
            self.meta.extend_from_slice(&0u32.to_le_bytes()); // no properties
            self.num_objects += 1;

            for v in values {
                self.raw.extend_from_slice(&v.to_le_bytes());
            }
            self.toc |= TOC_RAW_DATA;
            self
        }

        fn i32_channel(mut self, group: &str, name: &str, values: &[i32]) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'/'{}'", group, name));
            self.meta.extend_from_slice(&20u32.to_le_bytes());
            self.meta.extend_from_slice(&0x03u32.to_le_bytes()); // i32
            self.meta.extend_from_slice(&1u32.to_le_bytes());
            self.meta
                .extend_from_slice(&(values.len() as u64).to_le_bytes());
            self.meta.extend_from_slice(&0u32.to_le_bytes());
            self.num_objects += 1;

            for v in values {
                self.raw.extend_from_slice(&v.to_le_bytes());
            }
            self.toc |= TOC_RAW_DATA;
            self
        }

        fn string_channel(mut self, group: &str, name: &str, values: &[&str]) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'/'{}'", group, name));

            let mut block = Vec::new();
            let mut end = 0u32;
            for v in values {
                end += v.len() as u32;
                block.extend_from_slice(&end.to_le_bytes());
            }
            for v in values {
                block.extend_from_slice(v.as_bytes());
            }

            self.meta.extend_from_slice(&28u32.to_le_bytes());
            self.meta.extend_from_slice(&0x20u32.to_le_bytes()); // string
            self.meta.extend_from_slice(&1u32.to_le_bytes());
            self.meta
                .extend_from_slice(&(values.len() as u64).to_le_bytes());
            self.meta
                .extend_from_slice(&(block.len() as u64).to_le_bytes());
            self.meta.extend_from_slice(&0u32.to_le_bytes());
            self.num_objects += 1;

            self.raw.extend_from_slice(&block);
            self.toc |= TOC_RAW_DATA;
            self
        }

        // Segment keeps the previous segment's object list.
        fn keep_object_list(mut self) -> Self {
            self.toc &= !TOC_NEW_OBJ_LIST;
            self
        }

        // Channel re-listed without raw data in this segment.
        fn no_data_channel(mut self, group: &str, name: &str) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'/'{}'", group, name));
            self.meta.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            self.meta.extend_from_slice(&0u32.to_le_bytes()); // no properties
            self.num_objects += 1;
            self
        }

        // Raw f64 data for channels already active from the kept object list.
        fn raw_f64(mut self, values: &[f64]) -> Self {
            for v in values {
                self.raw.extend_from_slice(&v.to_le_bytes());
            }
            self.toc |= TOC_RAW_DATA;
            self
        }

        // Channel that reuses its raw data index from an earlier segment.
        fn repeat_channel(mut self, group: &str, name: &str, values: &[f64]) -> Self {
            Self::push_string(&mut self.meta, &format!("/'{}'/'{}'", group, name));
            self.meta.extend_from_slice(&0u32.to_le_bytes()); // same as previous
            self.meta.extend_from_slice(&0u32.to_le_bytes()); // no properties
            self.num_objects += 1;

            for v in values {
                self.raw.extend_from_slice(&v.to_le_bytes());
            }
            self.toc |= TOC_RAW_DATA;
            self
        }

        fn build(self) -> Vec<u8> {
            let mut meta = (self.num_objects).to_le_bytes().to_vec();
            meta.extend_from_slice(&self.meta);

            let mut out = Vec::new();
            out.extend_from_slice(LEAD_IN_TAG);
            out.extend_from_slice(&self.toc.to_le_bytes());
            out.extend_from_slice(&4713u32.to_le_bytes());
            out.extend_from_slice(&((meta.len() + self.raw.len()) as u64).to_le_bytes());
            out.extend_from_slice(&(meta.len() as u64).to_le_bytes());
            out.extend_from_slice(&meta);
            out.extend_from_slice(&self.raw);
            out
        }
    }

    #[test]
    fn test_single_segment_two_channels() {
        let data = SegmentBuilder::new()
            .group("Voltage")
            .f64_channel("Voltage", "ch0", &[0.5, 1.5, 2.5])
            .i32_channel("Voltage", "ch1", &[7, 8, 9])
            .build();

        let file = TdmsFile::from_bytes(&data).unwrap();
        assert_eq!(file.group_count(), 1);

        let table = &file.groups()[0];
        assert_eq!(table.name(), "Voltage");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.row(1), vec!["1", "1.5", "8"]);
    }

    #[test]
    fn test_multiple_segments_append_in_order() {
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        data.extend(
            SegmentBuilder::new()
                .repeat_channel("G", "ch", &[3.0, 4.0])
                .build(),
        );

        let file = TdmsFile::from_bytes(&data).unwrap();
        let table = &file.groups()[0];
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.row(3), vec!["3", "4"]);
    }

    #[test]
    fn test_string_channel() {
        let data = SegmentBuilder::new()
            .string_channel("Log", "msg", &["alpha", "", "beta,comma"])
            .build();

        let file = TdmsFile::from_bytes(&data).unwrap();
        let table = &file.groups()[0];
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.row(0), vec!["0", "alpha"]);
        assert_eq!(table.row(1), vec!["1", ""]);
        assert_eq!(table.row(2), vec!["2", "beta,comma"]);
    }

    #[test]
    fn test_group_without_channels_is_empty_table() {
        let data = SegmentBuilder::new().group("Empty").build();

        let file = TdmsFile::from_bytes(&data).unwrap();
        assert_eq!(file.group_count(), 1);
        assert!(file.groups()[0].is_empty());
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let data = SegmentBuilder::new()
            .group("B")
            .group("A")
            .f64_channel("C", "ch", &[1.0])
            .build();

        let file = TdmsFile::from_bytes(&data).unwrap();
        let names: Vec<&str> = file.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_repeated_chunk_raw_data() {
        // One declared chunk of 2 values, raw region holds 3 chunks.
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        let extra: Vec<u8> = [3.0f64, 4.0, 5.0, 6.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        data.extend_from_slice(&extra);

        // Patch next_segment_offset to cover the extra chunks.
        let old_len = u64::from_le_bytes(data[12..20].try_into().unwrap());
        let new_len = old_len + extra.len() as u64;
        data[12..20].copy_from_slice(&new_len.to_le_bytes());

        let file = TdmsFile::from_bytes(&data).unwrap();
        let table = &file.groups()[0];
        assert_eq!(table.row_count(), 6);
        assert_eq!(table.row(5), vec!["5", "6"]);
    }

    #[test]
    fn test_incomplete_final_segment_reads_whole_chunks() {
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        // Mark the segment as unpatched and truncate half a chunk.
        data[12..20].copy_from_slice(&u64::MAX.to_le_bytes());
        data.truncate(data.len() - 8);

        let file = TdmsFile::from_bytes(&data).unwrap();
        assert_eq!(file.groups()[0].row_count(), 0);
    }

    #[test]
    fn test_bad_tag_is_invalid_format() {
        let result = TdmsFile::from_bytes(b"not a tdms file at all");
        assert!(matches!(result, Err(BatchError::InvalidFormat { .. })));
    }

    #[test]
    fn test_empty_file_is_invalid_format() {
        assert!(matches!(
            TdmsFile::from_bytes(b""),
            Err(BatchError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_big_endian_is_unsupported() {
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0])
            .build();
        let toc = u32::from_le_bytes(data[4..8].try_into().unwrap()) | TOC_BIG_ENDIAN;
        data[4..8].copy_from_slice(&toc.to_le_bytes());

        assert!(matches!(
            TdmsFile::from_bytes(&data),
            Err(BatchError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_truncated_metadata_is_invalid_format() {
        let data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        let result = TdmsFile::from_bytes(&data[..40]);
        assert!(matches!(result, Err(BatchError::InvalidFormat { .. })));
    }

    #[test]
    fn test_oversized_next_segment_offset_is_invalid_format() {
        // Large but not the u64::MAX incomplete marker; the addition must
        // not wrap into a bogus segment end.
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        data[12..20].copy_from_slice(&(u64::MAX - 8).to_le_bytes());

        assert!(matches!(
            TdmsFile::from_bytes(&data),
            Err(BatchError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_oversized_raw_data_offset_is_invalid_format() {
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "ch", &[1.0, 2.0])
            .build();
        data[20..28].copy_from_slice(&(u64::MAX - 4).to_le_bytes());

        assert!(matches!(
            TdmsFile::from_bytes(&data),
            Err(BatchError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_chunk_size_overflow_is_invalid_format() {
        // Two string channels whose declared byte sizes sum past u64::MAX.
        let mut meta = 2u32.to_le_bytes().to_vec();
        for name in ["a", "b"] {
            SegmentBuilder::push_string(&mut meta, &format!("/'G'/'{}'", name));
            meta.extend_from_slice(&28u32.to_le_bytes());
            meta.extend_from_slice(&0x20u32.to_le_bytes()); // string
            meta.extend_from_slice(&1u32.to_le_bytes());
            meta.extend_from_slice(&1u64.to_le_bytes()); // one value
            meta.extend_from_slice(&(u64::MAX - 1).to_le_bytes()); // total bytes
            meta.extend_from_slice(&0u32.to_le_bytes());
        }

        let mut data = Vec::new();
        data.extend_from_slice(LEAD_IN_TAG);
        data.extend_from_slice(&(TOC_META_DATA | TOC_NEW_OBJ_LIST | TOC_RAW_DATA).to_le_bytes());
        data.extend_from_slice(&4713u32.to_le_bytes());
        data.extend_from_slice(&(meta.len() as u64).to_le_bytes());
        data.extend_from_slice(&(meta.len() as u64).to_le_bytes());
        data.extend_from_slice(&meta);

        assert!(matches!(
            TdmsFile::from_bytes(&data),
            Err(BatchError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_no_data_relisting_deactivates_channel() {
        // Segment 2 keeps the object list but re-lists `a` without raw
        // data; its raw bytes belong to `b` alone.
        let mut data = SegmentBuilder::new()
            .f64_channel("G", "a", &[1.0, 2.0])
            .f64_channel("G", "b", &[10.0, 20.0])
            .build();
        data.extend(
            SegmentBuilder::new()
                .keep_object_list()
                .no_data_channel("G", "a")
                .raw_f64(&[30.0, 40.0])
                .build(),
        );

        let file = TdmsFile::from_bytes(&data).unwrap();
        let table = &file.groups()[0];
        assert_eq!(table.row_count(), 4);
        // `a` keeps its 2 values; `b` received the new chunk.
        assert_eq!(table.row(1), vec!["1", "2", "20"]);
        assert_eq!(table.row(3), vec!["3", "", "40"]);
    }

    #[test]
    fn test_index_reuse_before_definition_is_rejected() {
        let data = SegmentBuilder::new()
            .repeat_channel("G", "ch", &[1.0])
            .build();
        assert!(matches!(
            TdmsFile::from_bytes(&data),
            Err(BatchError::InvalidFormat { .. })
        ));
    }
}
