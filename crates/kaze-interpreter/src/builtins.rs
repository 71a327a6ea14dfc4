//! Native functions exposed to Kaze programs.
//!
//! Builtins are resolved as a fallback of identifier lookup, so a user
//! binding named `len` shadows the native one. They are first-class values
//! compared by table identity.

use std::fs;

use kaze_syntax::error::{error, Result};

use crate::value::{Builtin, Value};

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "print",
        func: builtin_print,
    },
    Builtin {
        name: "println",
        func: builtin_println,
    },
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "append",
        func: builtin_append,
    },
    Builtin {
        name: "string",
        func: builtin_string,
    },
    Builtin {
        name: "int",
        func: builtin_int,
    },
    Builtin {
        name: "ord",
        func: builtin_ord,
    },
    Builtin {
        name: "chr",
        func: builtin_chr,
    },
    Builtin {
        name: "args",
        func: builtin_args,
    },
    Builtin {
        name: "readFile",
        func: builtin_read_file,
    },
];

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

fn want_args(args: &[Value], want: usize) -> Result<()> {
    if args.len() != want {
        error(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        ))
    } else {
        Ok(())
    }
}

fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn builtin_print(args: &[Value]) -> Result<Value> {
    print!("{}", join_args(args));
    Ok(Value::Null)
}

fn builtin_println(args: &[Value]) -> Result<Value> {
    println!("{}", join_args(args));
    Ok(Value::Null)
}

fn builtin_len(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.len() as i64)),
        Value::Array(elements) => Ok(Value::Int(elements.borrow().len() as i64)),
        Value::Hash(pairs) => Ok(Value::Int(pairs.borrow().len() as i64)),
        other => error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

/// Returns a new array; the argument is left untouched.
fn builtin_append(args: &[Value]) -> Result<Value> {
    want_args(args, 2)?;
    match &args[0] {
        Value::Array(elements) => {
            let mut extended = elements.borrow().clone();
            extended.push(args[1].clone());
            Ok(Value::array(extended))
        }
        other => error(format!("cannot append to type: {}", other.type_name())),
    }
}

fn builtin_string(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    Ok(Value::Str(args[0].to_string()))
}

fn builtin_int(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Str(s) => match s.parse::<i64>() {
            Ok(n) => Ok(Value::Int(n)),
            Err(_) => Ok(Value::NaN),
        },
        _ => Ok(Value::NaN),
    }
}

fn builtin_ord(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    match &args[0] {
        Value::Str(s) if s.len() == 1 => Ok(Value::Int(i64::from(s.as_bytes()[0]))),
        _ => Ok(Value::NaN),
    }
}

fn builtin_chr(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    match &args[0] {
        Value::Int(n) => {
            let ch = u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Ok(Value::Str(ch.to_string()))
        }
        _ => Ok(Value::NaN),
    }
}

/// The full process argv as an array of strings.
fn builtin_args(args: &[Value]) -> Result<Value> {
    want_args(args, 0)?;
    Ok(Value::array(
        std::env::args().map(Value::Str).collect(),
    ))
}

fn builtin_read_file(args: &[Value]) -> Result<Value> {
    want_args(args, 1)?;
    match &args[0] {
        Value::Str(path) => match fs::read(path) {
            Ok(bytes) => Ok(Value::Str(
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(e) => error(e.to_string()),
        },
        other => error(format!(
            "cannot read file from type: {}",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(lookup("len").is_some());
        assert!(lookup("println").is_some());
        assert!(lookup("missing").is_none());
    }

    #[test]
    fn test_len() {
        let v = builtin_len(&[Value::Str("hello".into())]).unwrap();
        assert!(matches!(v, Value::Int(5)));
        let v = builtin_len(&[Value::array(vec![Value::Int(1), Value::Int(2)])]).unwrap();
        assert!(matches!(v, Value::Int(2)));
        assert!(builtin_len(&[Value::Int(42)]).is_err());
        assert!(builtin_len(&[]).is_err());
    }

    #[test]
    fn test_append_does_not_mutate() {
        let original = Value::array(vec![Value::Int(1)]);
        let extended = builtin_append(&[original.clone(), Value::Int(2)]).unwrap();
        let Value::Array(orig) = &original else { unreachable!() };
        let Value::Array(ext) = &extended else { panic!("expected array") };
        assert_eq!(orig.borrow().len(), 1);
        assert_eq!(ext.borrow().len(), 2);
    }

    #[test]
    fn test_int_conversion() {
        assert!(matches!(
            builtin_int(&[Value::Str("42".into())]).unwrap(),
            Value::Int(42)
        ));
        assert!(matches!(
            builtin_int(&[Value::Str("abc".into())]).unwrap(),
            Value::NaN
        ));
        assert!(matches!(
            builtin_int(&[Value::Bool(true)]).unwrap(),
            Value::NaN
        ));
    }

    #[test]
    fn test_ord_and_chr() {
        assert!(matches!(
            builtin_ord(&[Value::Str("A".into())]).unwrap(),
            Value::Int(65)
        ));
        assert!(matches!(
            builtin_ord(&[Value::Str("AB".into())]).unwrap(),
            Value::NaN
        ));
        assert!(matches!(
            builtin_chr(&[Value::Int(65)]).unwrap(),
            Value::Str(s) if s == "A"
        ));
    }

    #[test]
    fn test_string_conversion() {
        assert!(matches!(
            builtin_string(&[Value::Int(42)]).unwrap(),
            Value::Str(s) if s == "42"
        ));
        assert!(matches!(
            builtin_string(&[Value::Bool(true)]).unwrap(),
            Value::Str(s) if s == "true"
        ));
    }
}
