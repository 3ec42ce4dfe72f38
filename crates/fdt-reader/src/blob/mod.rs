pub use self::{fdt::*, header::*, reserved_memory::*};

mod fdt;
mod header;
mod reserved_memory;
