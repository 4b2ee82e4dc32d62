//! Generic walker: rebuilds a small value tree through the cursor API

use std::io::Read;

use jsonwalk_core::{Element, Kind, Result, Stream};

/// Simplified value. Strings and objects have no accessor, so they are
/// skipped and recorded by kind only.
#[derive(Debug, Clone, PartialEq)]
pub enum V {
    Array(Vec<V>),
    Bool(bool),
    Int(i64),
    Null,
    Skipped(Kind),
}

/// Walk one element and everything below it.
pub fn walk<R: Read>(element: &mut Element<'_, R>) -> Result<V> {
    Ok(match element.kind() {
        Kind::Array => {
            let mut items = Vec::new();
            while let Some(mut child) = element.array_next()? {
                items.push(walk(&mut child)?);
            }
            V::Array(items)
        }
        Kind::Boolean => V::Bool(element.boolean()?),
        Kind::Number => V::Int(element.number::<i64>()?),
        Kind::Null => {
            element.null()?;
            V::Null
        }
        kind @ (Kind::String | Kind::Object) => {
            element.skip()?;
            V::Skipped(kind)
        }
    })
}

/// Walk a whole document and check nothing but whitespace follows it.
pub fn walk_str(input: &str) -> Result<V> {
    super::init_logging();
    let mut stream = Stream::new(input.as_bytes());
    let value = walk(&mut stream.root()?)?;
    stream.finish()?;
    Ok(value)
}
