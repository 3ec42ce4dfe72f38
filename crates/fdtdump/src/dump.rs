use std::{fmt, io};

use bstr::BStr;
use fdt_reader::{Fdt, Tag};
use snafu::ResultExt as _;
use snafu_utils::GenericError;

const INDENT: &str = "    ";

/// Writes the header fields as DTS comments.
pub fn write_header<W>(out: &mut W, fdt: &Fdt<'_>) -> io::Result<()>
where
    W: io::Write,
{
    let header = fdt.header();
    writeln!(out, "// magic:\t\t{:#x}", header.magic())?;
    writeln!(
        out,
        "// totalsize:\t\t{:#x} ({})",
        header.total_size(),
        header.total_size()
    )?;
    writeln!(out, "// off_dt_struct:\t{:#x}", header.struct_block_offset())?;
    writeln!(out, "// off_dt_strings:\t{:#x}", header.strings_block_offset())?;
    writeln!(
        out,
        "// off_mem_rsvmap:\t{:#x}",
        header.memory_reservation_block_offset()
    )?;
    writeln!(out, "// version:\t\t{}", header.version())?;
    writeln!(
        out,
        "// last_comp_version:\t{}",
        header.last_compatible_version()
    )?;
    writeln!(out, "// boot_cpuid_phys:\t{:#x}", header.boot_cpuid_phys())?;
    writeln!(out, "// size_dt_strings:\t{:#x}", header.strings_block_size())?;
    writeln!(out, "// size_dt_struct:\t{:#x}", header.struct_block_size())?;
    writeln!(out)
}

/// Writes the memory reservation block as `/memreserve/` lines.
pub fn write_reservations<W>(out: &mut W, fdt: &Fdt<'_>) -> Result<(), GenericError>
where
    W: io::Write,
{
    for entry in fdt.reserve_entries() {
        let entry = entry.whatever_context("failed to read memory reservation block")?;
        writeln!(
            out,
            "/memreserve/ {:#018x} {:#018x};",
            entry.address(),
            entry.size()
        )
        .whatever_context("failed to write output")?;
    }
    Ok(())
}

/// Writes the structure block in DTS syntax by walking its tags.
pub fn write_tree<W>(out: &mut W, fdt: &Fdt<'_>) -> Result<(), GenericError>
where
    W: io::Write,
{
    let mut depth = 0_usize;
    for res in fdt.tags() {
        let (offset, tag) = res.whatever_context("failed to walk structure block")?;
        trace!("tag at {offset:#x}: {tag:?}");
        match tag {
            Tag::BeginNode { name } => {
                let name = if depth == 0 && name.is_empty() {
                    BStr::new("/")
                } else {
                    BStr::new(name)
                };
                writeln!(out, "{}{name} {{", Indent(depth))
                    .whatever_context("failed to write output")?;
                depth += 1;
            }
            Tag::EndNode => {
                depth = depth.saturating_sub(1);
                writeln!(out, "{}}};", Indent(depth)).whatever_context("failed to write output")?;
            }
            Tag::Prop { .. } => {
                let prop = fdt
                    .get_property_by_offset(offset)
                    .with_whatever_context(|_| format!("failed to read property at {offset:#x}"))?;
                let name = BStr::new(prop.name());
                let value = prop.value();
                let res = if value.is_empty() {
                    writeln!(out, "{}{name};", Indent(depth))
                } else {
                    writeln!(out, "{}{name} = {};", Indent(depth), Value(value))
                };
                res.whatever_context("failed to write output")?;
            }
            Tag::Nop | Tag::End => {}
        }
    }
    Ok(())
}

struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str(INDENT)?;
        }
        Ok(())
    }
}

/// A property value in DTS syntax: a string list, a cell list, or bytes.
struct Value<'a>(&'a [u8]);

impl Value<'_> {
    fn is_string_list(&self) -> bool {
        let Some((&0, body)) = self.0.split_last() else {
            return false;
        };
        !body.is_empty()
            && body.split(|&b| b == 0).all(|s| {
                !s.is_empty() && s.iter().all(|&b| b.is_ascii_graphic() || b == b' ')
            })
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_string_list() {
            let body = &self.0[..self.0.len() - 1];
            for (i, s) in body.split(|&b| b == 0).enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "\"{}\"", s.escape_ascii())?;
            }
            return Ok(());
        }

        if self.0.len().is_multiple_of(4) {
            f.write_str("<")?;
            for (i, cell) in self.0.chunks_exact(4).enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                let cell = u32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]]);
                write!(f, "{cell:#010x}")?;
            }
            return f.write_str(">");
        }

        f.write_str("[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        f.write_str("]")
    }
}
