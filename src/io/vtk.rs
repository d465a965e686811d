//! VTK XML reader for `ImageData` (`.vti`) and `UnstructuredGrid` (`.vtu`).
//!
//! Handles `ascii`, inline `binary` and `appended` arrays (raw or base64),
//! optional zlib compression, 32/64-bit headers and either byte order. Only
//! the first `Piece` is read and only point data is kept.

use crate::mesh::{Cell, CellType, Dataset, Field, ImageData, MeshError};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::ZlibDecoder;
use glam::DVec3;
use roxmltree::{Document, Node};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("XML section is not valid UTF-8")]
    Utf8,
    #[error("expected a `{expected}` file, found `{found}`")]
    WrongType { expected: &'static str, found: String },
    #[error("missing element <{0}>")]
    MissingElement(&'static str),
    #[error("missing attribute `{attr}` on <{element}>")]
    MissingAttribute { element: String, attr: &'static str },
    #[error("invalid value `{value}` for attribute `{attr}`")]
    InvalidAttribute { attr: &'static str, value: String },
    #[error("unsupported data type `{0}`")]
    UnsupportedType(String),
    #[error("unsupported array format `{0}`")]
    UnsupportedFormat(String),
    #[error("unsupported compressor `{0}`")]
    UnsupportedCompressor(String),
    #[error("unsupported cell type id {0}")]
    UnsupportedCell(i64),
    #[error("invalid value {value} in `{name}`, expected a non-negative integer")]
    InvalidIndex { name: &'static str, value: f64 },
    #[error("array `{name}` has {actual} values, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("binary data of array `{0}` is truncated")]
    Truncated(String),
    #[error("array refers to appended data but the file has no <AppendedData>")]
    NoAppendedData,
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

macro_rules! decode_num {
    ($t:ty, $bytes:expr, $big:expr) => {{
        let mut buf = [0u8; std::mem::size_of::<$t>()];
        buf.copy_from_slice($bytes);
        (if $big {
            <$t>::from_be_bytes(buf)
        } else {
            <$t>::from_le_bytes(buf)
        }) as f64
    }};
}

impl Scalar {
    fn parse(name: &str) -> Result<Self, VtkError> {
        let t = match name {
            "Int8" | "Char" => Scalar::I8,
            "UInt8" | "UnsignedChar" => Scalar::U8,
            "Int16" | "Short" => Scalar::I16,
            "UInt16" | "UnsignedShort" => Scalar::U16,
            "Int32" | "Int" => Scalar::I32,
            "UInt32" | "UnsignedInt" => Scalar::U32,
            "Int64" | "Long" | "LongLong" | "IdType" => Scalar::I64,
            "UInt64" | "UnsignedLong" | "UnsignedLongLong" => Scalar::U64,
            "Float32" | "Float" => Scalar::F32,
            "Float64" | "Double" => Scalar::F64,
            other => return Err(VtkError::UnsupportedType(other.to_string())),
        };
        Ok(t)
    }

    fn size(self) -> usize {
        match self {
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
        }
    }

    fn decode(self, b: &[u8], big: bool) -> f64 {
        match self {
            Scalar::I8 => decode_num!(i8, b, big),
            Scalar::U8 => decode_num!(u8, b, big),
            Scalar::I16 => decode_num!(i16, b, big),
            Scalar::U16 => decode_num!(u16, b, big),
            Scalar::I32 => decode_num!(i32, b, big),
            Scalar::U32 => decode_num!(u32, b, big),
            Scalar::I64 => decode_num!(i64, b, big),
            Scalar::U64 => decode_num!(u64, b, big),
            Scalar::F32 => decode_num!(f32, b, big),
            Scalar::F64 => decode_num!(f64, b, big),
        }
    }
}

// File-wide settings from the <VTKFile> element
#[derive(Debug, Clone, Copy)]
struct Layout {
    big_endian: bool,
    header: Scalar,
    compressed: bool,
}

impl Layout {
    fn word(&self, bytes: &[u8], index: usize, name: &str) -> Result<usize, VtkError> {
        let size = self.header.size();
        let chunk = bytes
            .get(index * size..(index + 1) * size)
            .ok_or_else(|| VtkError::Truncated(name.to_string()))?;
        Ok(self.header.decode(chunk, self.big_endian) as usize)
    }

    /// Payload of a binary array whose header starts at `data[0]`.
    fn unpack(&self, data: &[u8], name: &str) -> Result<Vec<u8>, VtkError> {
        let h = self.header.size();
        let truncated = || VtkError::Truncated(name.to_string());
        if !self.compressed {
            let n = self.word(data, 0, name)?;
            return data.get(h..h + n).map(<[u8]>::to_vec).ok_or_else(truncated);
        }
        let blocks = self.word(data, 0, name)?;
        let mut pos = h * (3 + blocks);
        let mut out = Vec::new();
        for b in 0..blocks {
            let size = self.word(data, 3 + b, name)?;
            let chunk = data.get(pos..pos + size).ok_or_else(truncated)?;
            ZlibDecoder::new(chunk).read_to_end(&mut out)?;
            pos += size;
        }
        Ok(out)
    }

    /// Length in bytes of header plus payload as stored, read from the
    /// header at the start of `data`.
    fn stored_len(&self, header: &[u8], name: &str) -> Result<(usize, usize), VtkError> {
        let h = self.header.size();
        if !self.compressed {
            return Ok((h, self.word(header, 0, name)?));
        }
        let blocks = self.word(header, 0, name)?;
        let payload = (0..blocks)
            .map(|b| self.word(header, 3 + b, name))
            .sum::<Result<usize, _>>()?;
        Ok((h * (3 + blocks), payload))
    }

    /// Decode a base64 array. Compressed arrays encode the header and the
    /// blocks separately; uncompressed ones encode both in one stream.
    fn unpack_base64(&self, text: &[u8], name: &str) -> Result<Vec<u8>, VtkError> {
        let h = self.header.size();
        let chars = |bytes: usize| bytes.div_ceil(3) * 4;
        let slice = |end: usize| text.get(..end).ok_or_else(|| VtkError::Truncated(name.to_string()));

        if !self.compressed {
            let head = STANDARD.decode(slice(chars(h))?)?;
            let (_, payload) = self.stored_len(&head, name)?;
            let all = STANDARD.decode(slice(chars(h + payload))?)?;
            return self.unpack(&all, name);
        }

        let first = STANDARD.decode(slice(chars(3 * h))?)?;
        let blocks = self.word(&first, 0, name)?;
        let header_chars = chars(h * (3 + blocks));
        let mut raw = STANDARD.decode(slice(header_chars)?)?;
        let (header_len, payload) = self.stored_len(&raw, name)?;
        raw.truncate(header_len);
        let body = text
            .get(header_chars..header_chars + chars(payload))
            .ok_or_else(|| VtkError::Truncated(name.to_string()))?;
        raw.extend(STANDARD.decode(body)?);
        self.unpack(&raw, name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppendedEncoding {
    Raw,
    Base64,
}

struct ReadContext<'a> {
    layout: Layout,
    appended: Option<(&'a [u8], AppendedEncoding)>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Separate the XML markup from the binary appended block, which is not
/// valid XML. Returns the markup with an empty `<AppendedData>` element and
/// the bytes following the `_` marker.
fn split_appended(bytes: &[u8]) -> Result<(String, Option<&[u8]>), VtkError> {
    let to_str = |b: &[u8]| std::str::from_utf8(b).map(str::to_owned).map_err(|_| VtkError::Utf8);
    let Some(tag) = find(bytes, b"<AppendedData") else {
        return Ok((to_str(bytes)?, None));
    };
    let open_end = find(&bytes[tag..], b">")
        .map(|i| tag + i)
        .ok_or(VtkError::MissingElement("AppendedData"))?;
    let marker = find(&bytes[open_end..], b"_")
        .map(|i| open_end + i)
        .ok_or(VtkError::MissingElement("AppendedData"))?;
    let close = rfind(bytes, b"</AppendedData>")
        .filter(|&c| c > marker)
        .ok_or(VtkError::MissingElement("AppendedData"))?;
    let mut xml = to_str(&bytes[..=open_end])?;
    xml.push_str(&to_str(&bytes[close..])?);
    Ok((xml, Some(&bytes[marker + 1..close])))
}

fn child<'a, 'i>(node: Node<'a, 'i>, tag: &'static str) -> Result<Node<'a, 'i>, VtkError> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .ok_or(VtkError::MissingElement(tag))
}

fn attr<'a>(node: Node<'a, '_>, name: &'static str) -> Result<&'a str, VtkError> {
    node.attribute(name).ok_or_else(|| VtkError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attr: name,
    })
}

fn parse_attr<T: std::str::FromStr>(node: Node, name: &'static str) -> Result<T, VtkError> {
    let raw = attr(node, name)?;
    raw.trim().parse().map_err(|_| VtkError::InvalidAttribute {
        attr: name,
        value: raw.to_string(),
    })
}

fn parse_list<T: std::str::FromStr, const N: usize>(node: Node, name: &'static str) -> Result<[T; N], VtkError>
where
    T: Copy + Default,
{
    let raw = attr(node, name)?;
    let invalid = || VtkError::InvalidAttribute {
        attr: name,
        value: raw.to_string(),
    };
    let values: Vec<T> = raw
        .split_whitespace()
        .map(|v| v.parse().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    if values.len() != N {
        return Err(invalid());
    }
    let mut out = [T::default(); N];
    out.copy_from_slice(&values);
    Ok(out)
}

/// Components and flat values of one `<DataArray>`.
fn read_array(node: Node, ctx: &ReadContext) -> Result<(usize, Vec<f64>), VtkError> {
    let name = node.attribute("Name").unwrap_or("<unnamed>");
    let scalar = Scalar::parse(attr(node, "type")?)?;
    let components = match node.attribute("NumberOfComponents") {
        Some(_) => parse_attr::<usize>(node, "NumberOfComponents")?.max(1),
        None => 1,
    };
    let format = node.attribute("format").unwrap_or("ascii");

    let bytes = match format {
        "ascii" => {
            let values = node
                .text()
                .unwrap_or("")
                .split_whitespace()
                .map(|v| {
                    v.parse::<f64>().map_err(|_| VtkError::InvalidAttribute {
                        attr: "ascii value",
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok((components, values));
        }
        "binary" => {
            let text: Vec<u8> = node
                .text()
                .unwrap_or("")
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            ctx.layout.unpack_base64(&text, name)?
        }
        "appended" => {
            let (block, encoding) = ctx.appended.ok_or(VtkError::NoAppendedData)?;
            let offset: usize = parse_attr(node, "offset")?;
            let data = block
                .get(offset..)
                .ok_or_else(|| VtkError::Truncated(name.to_string()))?;
            match encoding {
                AppendedEncoding::Raw => ctx.layout.unpack(data, name)?,
                AppendedEncoding::Base64 => ctx.layout.unpack_base64(data, name)?,
            }
        }
        other => return Err(VtkError::UnsupportedFormat(other.to_string())),
    };

    let values = bytes
        .chunks_exact(scalar.size())
        .map(|c| scalar.decode(c, ctx.layout.big_endian))
        .collect();
    Ok((components, values))
}

fn to_index(name: &'static str, value: f64) -> Result<usize, VtkError> {
    if value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(VtkError::InvalidIndex { name, value })
    }
}

fn check_len(name: &str, values: &[f64], expected: usize) -> Result<(), VtkError> {
    if values.len() != expected {
        return Err(VtkError::SizeMismatch {
            name: name.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn read_point_data(piece: Node, ctx: &ReadContext, num_points: usize) -> Result<Vec<(String, Field)>, VtkError> {
    let Some(point_data) = piece.children().find(|n| n.has_tag_name("PointData")) else {
        return Ok(Vec::new());
    };
    let mut fields = Vec::new();
    for array in point_data.children().filter(|n| n.has_tag_name("DataArray")) {
        let name = attr(array, "Name")?;
        let (components, values) = read_array(array, ctx)?;
        check_len(name, &values, num_points * components)?;
        fields.push((name.to_string(), Field::new(components, values)));
    }
    Ok(fields)
}

fn with_document<T>(
    bytes: &[u8],
    expected: &'static str,
    read: impl FnOnce(Node, &ReadContext) -> Result<T, VtkError>,
) -> Result<T, VtkError> {
    let (xml, appended) = split_appended(bytes)?;
    let doc = Document::parse(&xml)?;
    let root = doc.root_element();
    let found = root.attribute("type").unwrap_or("");
    if found != expected {
        return Err(VtkError::WrongType {
            expected,
            found: found.to_string(),
        });
    }

    let header = match root.attribute("header_type") {
        None | Some("UInt32") => Scalar::U32,
        Some("UInt64") => Scalar::U64,
        Some(other) => {
            return Err(VtkError::InvalidAttribute {
                attr: "header_type",
                value: other.to_string(),
            });
        }
    };
    let compressed = match root.attribute("compressor") {
        None | Some("") => false,
        Some("vtkZLibDataCompressor") => true,
        Some(other) => return Err(VtkError::UnsupportedCompressor(other.to_string())),
    };
    let layout = Layout {
        big_endian: root.attribute("byte_order") == Some("BigEndian"),
        header,
        compressed,
    };

    let appended = match (appended, root.children().find(|n| n.has_tag_name("AppendedData"))) {
        (Some(block), Some(node)) => {
            let encoding = match node.attribute("encoding").unwrap_or("raw") {
                "raw" => AppendedEncoding::Raw,
                "base64" => AppendedEncoding::Base64,
                other => return Err(VtkError::UnsupportedFormat(other.to_string())),
            };
            Some((block, encoding))
        }
        _ => None,
    };

    let ctx = ReadContext { layout, appended };
    let grid = child(root, expected)?;
    read(grid, &ctx)
}

/// Parse the bytes of a `.vtu` file.
pub fn parse_vtu(bytes: &[u8]) -> Result<Dataset, VtkError> {
    with_document(bytes, "UnstructuredGrid", |grid, ctx| {
        let piece = child(grid, "Piece")?;
        let num_points: usize = parse_attr(piece, "NumberOfPoints")?;
        let num_cells: usize = parse_attr(piece, "NumberOfCells")?;

        let coords_node = child(child(piece, "Points")?, "DataArray")?;
        let (_, coords) = read_array(coords_node, ctx)?;
        check_len("Points", &coords, num_points * 3)?;
        let points = coords
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect();

        let cells_node = child(piece, "Cells")?;
        let named = |name: &'static str| -> Result<Vec<f64>, VtkError> {
            let node = cells_node
                .children()
                .find(|n| n.has_tag_name("DataArray") && n.attribute("Name") == Some(name))
                .ok_or(VtkError::MissingElement(name))?;
            Ok(read_array(node, ctx)?.1)
        };
        let connectivity = named("connectivity")?;
        let offsets = named("offsets")?;
        let types = named("types")?;
        check_len("offsets", &offsets, num_cells)?;
        check_len("types", &types, num_cells)?;

        let mut cells = Vec::with_capacity(num_cells);
        let mut start = 0usize;
        for (&end, &id) in offsets.iter().zip(&types) {
            let end = to_index("offsets", end)?;
            let ids = connectivity
                .get(start..end)
                .ok_or_else(|| VtkError::Truncated("connectivity".to_string()))?;
            let id = id as i64;
            let kind = u8::try_from(id)
                .ok()
                .and_then(CellType::from_vtk_id)
                .ok_or(VtkError::UnsupportedCell(id))?;
            let ids = ids
                .iter()
                .map(|&i| to_index("connectivity", i))
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(Cell::new(kind, ids));
            start = end;
        }

        let mut dataset = Dataset::new(points, cells)?;
        for (name, field) in read_point_data(piece, ctx, num_points)? {
            dataset = dataset.with_field(&name, field)?;
        }
        Ok(dataset)
    })
}

/// Parse the bytes of a `.vti` file.
pub fn parse_vti(bytes: &[u8]) -> Result<ImageData, VtkError> {
    with_document(bytes, "ImageData", |grid, ctx| {
        let whole: [i64; 6] = parse_list(grid, "WholeExtent")?;
        let origin: [f64; 3] = match grid.attribute("Origin") {
            Some(_) => parse_list(grid, "Origin")?,
            None => [0.0; 3],
        };
        let spacing: [f64; 3] = match grid.attribute("Spacing") {
            Some(_) => parse_list(grid, "Spacing")?,
            None => [1.0; 3],
        };
        let piece = child(grid, "Piece")?;
        let extent: [i64; 6] = match piece.attribute("Extent") {
            Some(_) => parse_list(piece, "Extent")?,
            None => whole,
        };

        let mut image = ImageData::new(extent, DVec3::from_array(origin), DVec3::from_array(spacing));
        let num_points = image.num_points();
        for (name, field) in read_point_data(piece, ctx, num_points)? {
            image = image.with_field(&name, field)?;
        }
        Ok(image)
    })
}

pub fn read_vtu(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let dataset = parse_vtu(&bytes).with_context(|| format!("Failed to parse VTU file: {:?}", path))?;
    log::info!(
        "Loaded {:?}: {} points, {} cells, fields {:?}",
        path,
        dataset.num_points(),
        dataset.num_cells(),
        dataset.point_data().keys().collect::<Vec<_>>()
    );
    Ok(dataset)
}

pub fn read_vti(path: &Path) -> Result<ImageData> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let image = parse_vti(&bytes).with_context(|| format!("Failed to parse VTI file: {:?}", path))?;
    log::info!(
        "Loaded {:?}: dims {:?}, fields {:?}",
        path,
        image.dims(),
        image.point_data().keys().collect::<Vec<_>>()
    );
    Ok(image)
}
