//! Assembler: segment text → binary image.
//!
//! The image is a 34-byte header (magic, data start, code start,
//! entrypoint offset) followed by the encoded data and code segments.
//! Instructions encode as `opcode << 3 | mode` with big-endian operands.

use std::fmt;

use super::Compilation;

/// ASCII magic at the start of every image, 22 bytes, no terminator.
pub const MAGIC: &str = "This is a kubo program";

#[derive(Debug, Clone, Copy)]
enum Opcode {
    Push = 0,
    Load = 1,
    Store = 2,
    Call = 3,
    Pop = 4,
    Ret = 5,
}

impl Opcode {
    fn encode(self, mode: u8) -> u8 {
        ((self as u8) << 3) | mode
    }
}

const CALL_EXTRINSIC: u8 = 0;
const CALL_INTRINSIC: u8 = 1;

/// Load sources.
const SOURCE_DATA: u8 = 0;
const SOURCE_LOCAL: u8 = 1;
const SOURCE_GLOBAL: u8 = 2;

/// Store destinations.
const DEST_LOCAL: u8 = 0;
const DEST_GLOBAL: u8 = 1;

fn intrinsic_ordinal(name: &str) -> Option<u8> {
    match name {
        "print" => Some(0),
        "println" => Some(1),
        "format" => Some(2),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub enum AssembleError {
    UnexpectedSegment(String),
    UnknownInstruction(String),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::UnexpectedSegment(segment) => {
                write!(f, "unexpected segment '{}' was reached", segment)
            }
            AssembleError::UnknownInstruction(line) => {
                write!(f, "unknown instruction '{}'", line)
            }
        }
    }
}

impl std::error::Error for AssembleError {}

/// Assemble the concatenated segment text into a binary image. Code
/// block offsets are recorded into the compilation context as they are
/// laid out.
pub fn assemble(text: &str, compilation: &mut Compilation) -> Result<Vec<u8>, AssembleError> {
    let (data_source, code_source) = split_segments(text);

    let data = assemble_data_segment(data_source)?;
    let code = assemble_code_segment(code_source, compilation)?;

    // Codegen always emits an entrypoint block.
    let entrypoint = compilation
        .code_offsets
        .get("entrypoint")
        .copied()
        .unwrap_or(0);

    let mut image = Vec::with_capacity(34 + data.len() + code.len());
    image.extend_from_slice(MAGIC.as_bytes());
    image.extend_from_slice(&0u32.to_be_bytes());
    image.extend_from_slice(&(data.len() as u32).to_be_bytes());
    image.extend_from_slice(&entrypoint.to_be_bytes());
    image.extend_from_slice(&data);
    image.extend_from_slice(&code);

    Ok(image)
}

/// Everything up to the first later line starting with `.` is the data
/// segment source; that line onward is the code segment source.
fn split_segments(text: &str) -> (&str, &str) {
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if offset > 0 && line.starts_with('.') {
            return (&text[..offset], &text[offset..]);
        }
        offset += line.len();
    }

    (text, "")
}

/// Encode `<size> <text>` entries: 4 bytes big-endian size, then the raw
/// text bytes.
fn assemble_data_segment(source: &str) -> Result<Vec<u8>, AssembleError> {
    let mut lines = source.lines();

    let header = lines.next().unwrap_or("").trim_end();
    if header != ".data" {
        return Err(AssembleError::UnexpectedSegment(header.to_string()));
    }

    let mut bytes = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (size, text) = line
            .split_once(' ')
            .ok_or_else(|| AssembleError::UnknownInstruction(line.to_string()))?;
        let size: u32 = size
            .parse()
            .map_err(|_| AssembleError::UnknownInstruction(line.to_string()))?;

        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.extend_from_slice(text.as_bytes());
    }

    Ok(bytes)
}

/// Encode function blocks. A `function <name>` or `entrypoint` line
/// starts a block and records its byte offset; the lines until the next
/// blank line are its instructions.
fn assemble_code_segment(
    source: &str,
    compilation: &mut Compilation,
) -> Result<Vec<u8>, AssembleError> {
    let mut lines = source.lines();

    let header = lines.next().unwrap_or("").trim_end();
    if header != ".code" {
        return Err(AssembleError::UnexpectedSegment(header.to_string()));
    }

    let mut bytes = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix("function ") {
            compilation
                .code_offsets
                .insert(name.to_string(), bytes.len() as u32);
            continue;
        }

        if line == "entrypoint" {
            compilation
                .code_offsets
                .insert("entrypoint".to_string(), bytes.len() as u32);
            continue;
        }

        encode_instruction(line, compilation, &mut bytes)?;
    }

    Ok(bytes)
}

fn encode_instruction(
    line: &str,
    compilation: &Compilation,
    bytes: &mut Vec<u8>,
) -> Result<(), AssembleError> {
    let unknown = || AssembleError::UnknownInstruction(line.to_string());

    let (opcode, operands) = line.split_once(' ').unwrap_or((line, ""));

    match opcode {
        "push" => {
            let value: i32 = operands.trim().parse().map_err(|_| unknown())?;
            bytes.push(Opcode::Push.encode(0));
            bytes.extend_from_slice(&value.to_be_bytes());
        }

        "load" => {
            let (source, offset) = parse_indexed(operands).ok_or_else(unknown)?;
            let tag = match source {
                ".data" => SOURCE_DATA,
                "scope" => SOURCE_LOCAL,
                "global" => SOURCE_GLOBAL,
                _ => return Err(unknown()),
            };
            bytes.push(Opcode::Load.encode(0));
            bytes.push(tag);
            bytes.extend_from_slice(&offset.to_be_bytes());
        }

        "store" => {
            let (dest, offset) = parse_indexed(operands).ok_or_else(unknown)?;
            let tag = match dest {
                "scope" => DEST_LOCAL,
                "global" => DEST_GLOBAL,
                _ => return Err(unknown()),
            };
            bytes.push(Opcode::Store.encode(0));
            bytes.push(tag);
            bytes.extend_from_slice(&offset.to_be_bytes());
        }

        "call" => {
            let name = operands.trim();
            if let Some(&offset) = compilation.code_offsets.get(name) {
                bytes.push(Opcode::Call.encode(CALL_EXTRINSIC));
                bytes.push(offset as u8);
            } else if let Some(ordinal) = intrinsic_ordinal(name) {
                bytes.push(Opcode::Call.encode(CALL_INTRINSIC));
                bytes.push(ordinal);
            } else {
                return Err(unknown());
            }
        }

        "pop" => bytes.push(Opcode::Pop.encode(0)),
        "ret" => bytes.push(Opcode::Ret.encode(0)),

        _ => return Err(unknown()),
    }

    Ok(())
}

/// Split `section[offset]` into its parts.
fn parse_indexed(operands: &str) -> Option<(&str, u32)> {
    let operands = operands.trim();
    let open = operands.find('[')?;
    let close = operands.find(']')?;
    let section = &operands[..open];
    let offset: u32 = operands.get(open + 1..close)?.parse().ok()?;
    Some((section, offset))
}
