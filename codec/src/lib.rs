//! Primitive readers for the Kiwi binary wire format. See
//! [https://github.com/evanw/kiwi](https://github.com/evanw/kiwi) for the
//! format itself.
//!
//! Everything here reads through a [ByteBuffer], a cursor over a borrowed byte
//! slice. Reads that run past the end of the slice fail with a [BoundsError].
//!
//! ```
//! use kiwigen_codec::*;
//!
//! let mut bb = ByteBuffer::new(&[0x41, 0x00, 0x7F, 0x00, 0x00, 0x00, 0x96, 0x01]);
//! assert_eq!(bb.read_string().unwrap().to_string_lossy(), "A");
//! assert_eq!(bb.read_var_float(), Ok(1.0));
//! assert_eq!(bb.read_var_uint(), Ok(150));
//! assert!(bb.is_empty());
//! ```

pub mod bb;
pub mod error;
pub mod text;

pub use bb::*;
pub use error::*;
pub use text::*;
