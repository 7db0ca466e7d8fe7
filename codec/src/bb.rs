use crate::{error::BoundsError, text::WideString};

/// A Kiwi byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// let mut bb = kiwigen_codec::ByteBuffer::new(&[0xC3, 0xA9, 0, 133, 242, 210, 237]);
/// assert_eq!(bb.read_string().unwrap(), "é");
/// assert_eq!(bb.read_var_float(), Ok(f64::from(123.456f32)));
/// ```
///
/// A failed read leaves the index somewhere between where the read started
/// and the end of the data. Drop the buffer after an error.
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn out_of_bounds(&self, needed: usize) -> BoundsError {
        BoundsError {
            offset:    self.index,
            needed,
            available: self.remaining(),
        }
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, BoundsError> {
        match self.data.get(self.index) {
            Some(&value) => {
                self.index += 1;
                Ok(value)
            }
            None => Err(self.out_of_bounds(1)),
        }
    }

    /// Try to read `len` raw bytes starting at the current index. The result
    /// aliases the underlying slice. Nothing is consumed on failure.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], BoundsError> {
        if len > self.remaining() {
            return Err(self.out_of_bounds(len));
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    /// Try to read a length-prefixed byte array. The length is a
    /// [read_var_uint](Self::read_var_uint); the bytes alias the underlying
    /// slice.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8], BoundsError> {
        let len = self.read_var_uint()?;
        match usize::try_from(len) {
            Ok(len) => self.read_bytes(len),
            Err(_) => Err(self.out_of_bounds(usize::MAX)),
        }
    }

    /// Try to read a variable-length signed integer starting at the current
    /// index. This is a zigzag-decoded [read_var_uint](Self::read_var_uint).
    pub fn read_var_int(&mut self) -> Result<i64, BoundsError> {
        let value = self.read_var_uint()?;
        Ok(if (value & 1) != 0 {
            !((value >> 1) as i64)
        } else {
            (value >> 1) as i64
        })
    }

    /// Try to read a variable-length unsigned integer starting at the current
    /// index.
    ///
    /// At most six bytes are consumed. Continuation bits past the sixth byte
    /// are ignored, so longer encodings are truncated to 42 bits and their
    /// trailing bytes are left unread.
    pub fn read_var_uint(&mut self) -> Result<u64, BoundsError> {
        let mut shift: u32 = 0;
        let mut result: u64 = 0;

        loop {
            let byte = self.read_byte()?;
            result |= u64::from(byte & 127) << shift;
            shift += 7;

            if (byte & 128) == 0 || shift > 35 {
                break;
            }
        }

        Ok(result)
    }

    /// Try to read a variable-length 32-bit floating-point number starting at
    /// the current index, widened to `f64`.
    pub fn read_var_float(&mut self) -> Result<f64, BoundsError> {
        let first = match self.data.get(self.index) {
            Some(&first) => first,
            None => return Err(self.out_of_bounds(1)),
        };

        // Optimization: use a single byte to store zero
        if first == 0 {
            self.index += 1;
            return Ok(0.0);
        }

        // Endian-independent 32-bit read
        let bytes = self.read_bytes(4)?;
        let mut bits = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        // Move the exponent back into place
        bits = bits.rotate_left(23);

        Ok(f64::from(f32::from_bits(bits)))
    }

    /// Try to read a NUL-terminated string starting at the current index.
    ///
    /// The lead byte of each code point decides its width: below 0xC0 is one
    /// byte, 0xC0-0xDF two, 0xE0-0xEF three, anything higher four.
    /// Continuation bytes contribute their low six bits. A code point of zero
    /// ends the string.
    pub fn read_string(&mut self) -> Result<WideString, BoundsError> {
        let mut result = WideString::new();

        loop {
            let a = u32::from(self.read_byte()?);
            let code_point = if a < 0xC0 {
                a
            } else {
                let b = u32::from(self.read_byte()?);
                if a < 0xE0 {
                    ((a & 0x1F) << 6) | (b & 0x3F)
                } else {
                    let c = u32::from(self.read_byte()?);
                    if a < 0xF0 {
                        ((a & 0x0F) << 12) | ((b & 0x3F) << 6) | (c & 0x3F)
                    } else {
                        let d = u32::from(self.read_byte()?);
                        ((a & 0x07) << 18) | ((b & 0x3F) << 12) | ((c & 0x3F) << 6) | (d & 0x3F)
                    }
                }
            };

            if code_point == 0 {
                return Ok(result);
            }
            result.push_code_point(code_point);
        }
    }

    /// Try to read a variable-length signed 64-bit integer starting at the
    /// current index.
    pub fn read_var_int64(&mut self) -> Result<i64, BoundsError> {
        let value = self.read_var_uint64()?;
        Ok((if (value & 1) != 0 {
            !(value >> 1)
        } else {
            value >> 1
        }) as i64)
    }

    /// Try to read a variable-length unsigned 64-bit integer starting at the
    /// current index.
    ///
    /// Seven bits are taken from each byte that has its continuation bit set,
    /// for at most eight such bytes. The byte that ends the loop (the first
    /// one without a continuation bit, or the ninth byte) is consumed but adds
    /// nothing to the value, so `[0x01]` reads as 0. Existing producers rely
    /// on this layout; keep it.
    pub fn read_var_uint64(&mut self) -> Result<u64, BoundsError> {
        let mut shift: u32 = 0;
        let mut result: u64 = 0;

        loop {
            let byte = self.read_byte()?;
            if (byte & 128) != 0 && shift < 56 {
                result |= u64::from(byte & 127) << shift;
                shift += 7;
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
fn oob(offset: usize, needed: usize, available: usize) -> BoundsError {
    BoundsError { offset, needed, available }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(oob(0, 2, 1)));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(3), Err(oob(3, 3, 2)));
    assert_eq!(bb.index(), 3);
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert_eq!(bb.read_bytes(1), Err(oob(5, 1, 0)));
}

#[test]
fn read_byte_array() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte_array();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(vec![].as_slice()));
    assert_eq!(read(&[2, 7, 8]), Ok(vec![7, 8].as_slice()));
    assert_eq!(read(&[3, 7, 8]), Err(oob(1, 3, 2)));
    assert_eq!(read(&[128]), Err(oob(1, 1, 0)));

    let data = [2, 10, 20, 1, 30];
    let mut bb = ByteBuffer::new(&data);
    let first = bb.read_byte_array().unwrap();
    let second = bb.read_byte_array().unwrap();
    assert_eq!(first, [10, 20]);
    assert_eq!(second, [30]);
    assert!(bb.is_empty());
}

#[test]
fn read_var_int() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_int();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(-1));
    assert_eq!(read(&[2]), Ok(1));
    assert_eq!(read(&[3]), Ok(-2));
    assert_eq!(read(&[4]), Ok(2));
    assert_eq!(read(&[127]), Ok(-64));
    assert_eq!(read(&[128]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[128, 0]), Ok(0));
    assert_eq!(read(&[128, 1]), Ok(64));
    assert_eq!(read(&[128, 2]), Ok(128));
    assert_eq!(read(&[129, 0]), Ok(-1));
    assert_eq!(read(&[129, 1]), Ok(-65));
    assert_eq!(read(&[129, 2]), Ok(-129));
    assert_eq!(read(&[253, 255, 7]), Ok(-65535));
    assert_eq!(read(&[254, 255, 7]), Ok(65535));
    assert_eq!(read(&[253, 255, 255, 255, 15]), Ok(-2147483647));
    assert_eq!(read(&[254, 255, 255, 255, 15]), Ok(2147483647));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(-2147483648));
}

#[test]
fn read_var_uint() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_uint();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[2]), Ok(2));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[128, 0]), Ok(0));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[128, 2]), Ok(256));
    assert_eq!(read(&[129, 0]), Ok(1));
    assert_eq!(read(&[129, 1]), Ok(129));
    assert_eq!(read(&[129, 2]), Ok(257));
    assert_eq!(read(&[253, 255, 7]), Ok(131069));
    assert_eq!(read(&[254, 255, 7]), Ok(131070));
    assert_eq!(read(&[253, 255, 255, 255, 15]), Ok(4294967293));
    assert_eq!(read(&[254, 255, 255, 255, 15]), Ok(4294967294));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(4294967295));
    assert_eq!(read(&[255, 255, 255, 255, 255, 1]), Ok(0xF_FFFF_FFFF));
    assert_eq!(read(&[255, 255, 255, 255, 255, 127]), Ok(0x3FF_FFFF_FFFF));
}

#[test]
fn read_var_uint_caps_at_six_bytes() {
    // 1 << 42 needs a seventh group; the decoder stops after the sixth.
    let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_var_uint(), Ok(0));
    assert_eq!(bb.index(), 6);
    assert_eq!(bb.read_byte(), Ok(0x01));

    let data = [0xFF; 8];
    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_var_uint(), Ok(0x3FF_FFFF_FFFF));
    assert_eq!(bb.index(), 6);

    // The sixth byte is consumed even with its continuation bit set.
    let mut bb = ByteBuffer::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x81]);
    assert_eq!(bb.read_var_uint(), Ok(1 << 35));
    assert!(bb.is_empty());
}

#[test]
fn read_var_float() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_float();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0.0));
    assert_eq!(read(&[0x7F, 0, 0, 0]), Ok(1.0));
    assert_eq!(read(&[133, 242, 210, 237]), Ok(f64::from(123.456f32)));
    assert_eq!(read(&[133, 243, 210, 237]), Ok(f64::from(-123.456f32)));
    assert_eq!(read(&[254, 255, 255, 255]), Ok(f64::from(f32::MIN)));
    assert_eq!(read(&[254, 254, 255, 255]), Ok(f64::from(f32::MAX)));
    assert_eq!(read(&[1, 1, 0, 0]), Ok(f64::from(-f32::MIN_POSITIVE)));
    assert_eq!(read(&[1, 0, 0, 0]), Ok(f64::from(f32::MIN_POSITIVE)));
    assert_eq!(read(&[255, 1, 0, 0]), Ok(f64::NEG_INFINITY));
    assert_eq!(read(&[255, 0, 0, 0]), Ok(f64::INFINITY));
    assert_eq!(read(&[255, 0, 0, 128]).map(|f| f.is_nan()), Ok(true));
    assert_eq!(read(&[0x7F, 0, 0]), Err(oob(0, 4, 3)));
}

#[test]
fn read_var_float_consumption() {
    let mut bb = ByteBuffer::new(&[0, 0x7F, 0, 0, 0, 0x7F]);
    assert_eq!(bb.read_var_float(), Ok(0.0));
    assert_eq!(bb.index(), 1);
    assert_eq!(bb.read_var_float(), Ok(1.0));
    assert_eq!(bb.index(), 5);
    assert_eq!(bb.read_var_float(), Err(oob(5, 4, 1)));
    assert_eq!(bb.index(), 5);
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string().map(|s| s.into_units());
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(vec![]));
    assert_eq!(read(&[97]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[97, 0]), Ok(vec![97]));
    assert_eq!(read(&[0x41, 0]), Ok(vec![0x41]));
    assert_eq!(read(&[97, 98, 99, 0]), Ok(vec![97, 98, 99]));
    assert_eq!(read(&[0xC3, 0xA9, 0]), Ok(vec![0xE9]));
    assert_eq!(read(&[0xE0, 0xA0, 0x80, 0]), Ok(vec![0x800]));
    assert_eq!(read(&[0xE0, 0xBF, 0xBF, 0]), Ok(vec![0xFFF]));
    assert_eq!(read(&[0xE1, 0x80, 0x80, 0]), Ok(vec![0xD800, 0xDC00]));
    assert_eq!(read(&[0xE1, 0x80, 0x81, 0]), Ok(vec![0xD800, 0xDC01]));
    assert_eq!(read(&[240, 159, 141, 149, 0]), Ok(vec![0xD878, 0xDF55]));
}

#[test]
fn read_string_stops_at_decoded_zero() {
    // An overlong two-byte zero ends the string just like a plain NUL.
    let mut bb = ByteBuffer::new(&[0x61, 0xC0, 0x80, 0x62, 0]);
    assert_eq!(bb.read_string().unwrap(), "a");
    assert_eq!(bb.index(), 3);
    assert_eq!(bb.read_string().unwrap(), "b");
}

#[test]
fn read_string_truncated() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[0xC3]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[0xE1, 0x80]), Err(oob(2, 1, 0)));
    assert_eq!(read(&[0xF0, 0x9F, 0x8D]), Err(oob(3, 1, 0)));
    assert_eq!(read(&[0xF0, 0x9F, 0x8D, 0x95]), Err(oob(4, 1, 0)));
}

#[test]
fn read_var_int64() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_int64();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[3]), Ok(0));
    assert_eq!(read(&[127]), Ok(0));
    assert_eq!(read(&[128]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[128, 1]), Ok(0));
    assert_eq!(read(&[129, 1]), Ok(-1));
    assert_eq!(read(&[130, 1]), Ok(1));
    assert_eq!(read(&[253, 255, 7]), Ok(-8191));
    assert_eq!(read(&[254, 255, 7]), Ok(8191));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(-134217728));
    assert_eq!(
        read(&[0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88]),
        Ok(0x7_0C14_2030_4040)
    );
    assert_eq!(
        read(&[0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x20]),
        Ok(-1)
    );
    assert_eq!(
        read(&[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        Ok(0x7F_FFFF_FFFF_FFFF)
    );
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        Ok(-0x80_0000_0000_0000)
    );
}

#[test]
fn read_var_uint64() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_uint64();
    assert_eq!(read(&[]), Err(oob(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[128]), Err(oob(1, 1, 0)));
    assert_eq!(read(&[129, 2]), Ok(1));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(0xFFF_FFFF));
    assert_eq!(
        read(&[0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88]),
        Ok(0xE_1828_4060_8080)
    );
    assert_eq!(
        read(&[0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x10]),
        Ok(1)
    );
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        Ok(0xFF_FFFF_FFFF_FFFF)
    );
}

#[test]
fn read_var_uint64_drops_the_terminal_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_uint64();
    assert_eq!(read(&[1]), Ok(0));
    assert_eq!(read(&[127]), Ok(0));
    assert_eq!(read(&[128, 1]), Ok(0));

    // The terminal byte is still consumed.
    let mut bb = ByteBuffer::new(&[0x85, 0x7F, 0x09]);
    assert_eq!(bb.read_var_uint64(), Ok(5));
    assert_eq!(bb.index(), 2);
    assert_eq!(bb.read_byte(), Ok(0x09));
}

#[test]
fn read_var_uint64_stops_after_nine_bytes() {
    let data = [0xFF; 10];
    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_var_uint64(), Ok(0xFF_FFFF_FFFF_FFFF));
    assert_eq!(bb.index(), 9);
}

#[test]
fn read_sequence() {
    let mut bb = ByteBuffer::new(&[
        0, 133, 242, 210, 237, 0xC3, 0xA9, 0, 149, 154, 239, 58, 2, 1, 2,
    ]);
    assert_eq!(bb.read_var_float(), Ok(0.0));
    assert_eq!(bb.read_var_float(), Ok(f64::from(123.456f32)));
    assert_eq!(bb.read_string().unwrap(), "é");
    assert_eq!(bb.read_var_uint(), Ok(123456789));
    assert_eq!(bb.read_byte_array(), Ok([1u8, 2].as_slice()));
    assert_eq!(bb.remaining(), 0);
}
