//! Back end of the PINS'24 compiler: frame layout, stack-machine code
//! generation and segment assembly.

pub mod assemble;
pub mod codegen;
pub mod decode;
mod error;
pub mod memory;
pub mod pdm;

pub use assemble::{assemble, Listing, Segments};
pub use codegen::{generate, Generated};
pub use error::CodegenError;
pub use memory::{organize, Access, Frame, Layout};

use pins_parser::Program;
use pins_seman::Bindings;

/// Run the whole back end on a resolved program.
pub fn compile(program: &Program, bindings: &Bindings) -> Result<Segments, CodegenError> {
    let layout = organize(program)?;
    let generated = generate(program, bindings, &layout)?;
    assemble(program, &layout, &generated)
}
