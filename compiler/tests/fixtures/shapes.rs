// Code generated by kiwigen. DO NOT EDIT.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Result(pub u64);

impl Result {
    pub const OK: Result = Result(0);
    pub const OK_: Result = Result(1);
    pub const FAILED: Result = Result(2);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn decode(bb: &mut ::kiwigen_codec::ByteBuffer<'_>) -> ::core::result::Result<Self, ::kiwigen_codec::BoundsError> {
        let mut result = <Self as ::core::default::Default>::default();
        result.x = bb.read_var_float()?;
        result.y = bb.read_var_float()?;
        ::core::result::Result::Ok(result)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub kind: ::core::option::Option<Result>,
    pub points: ::core::option::Option<::std::vec::Vec<Point>>,
    pub name: ::core::option::Option<::std::string::String>,
    pub parent: ::core::option::Option<::std::boxed::Box<Shape>>,
}

impl Shape {
    pub fn decode(bb: &mut ::kiwigen_codec::ByteBuffer<'_>) -> ::core::result::Result<Self, ::kiwigen_codec::BoundsError> {
        let mut result = <Self as ::core::default::Default>::default();
        loop {
            match bb.read_var_uint()? {
                0 => break,
                1 => result.kind = ::core::option::Option::Some(Result(bb.read_var_uint()?)),
                2 => result.points = ::core::option::Option::Some({
                    let size = bb.read_var_uint()?;
                    let mut values = ::std::vec::Vec::with_capacity(::core::cmp::min(::core::convert::TryFrom::try_from(size).unwrap_or(usize::MAX), bb.remaining()));
                    for _ in 0..size {
                        values.push(Point::decode(bb)?);
                    }
                    values
                }),
                3 => result.name = ::core::option::Option::Some(bb.read_string()?.to_string_lossy()),
                4 => result.parent = ::core::option::Option::Some(::std::boxed::Box::new(Shape::decode(bb)?)),
                _ => {}
            }
        }
        ::core::result::Result::Ok(result)
    }
}
