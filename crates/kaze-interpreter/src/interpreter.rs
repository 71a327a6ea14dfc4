//! Main evaluator engine.
//!
//! A single recursive walker over the AST. Statements and expressions both
//! evaluate to a [`Flow`]: runtime errors travel in the `Err` channel, while
//! `Return`/`Break`/`Continue` are ordinary flow variants that bubble until a
//! loop, a function application or the program top level handles them.

use std::collections::HashMap;
use std::rc::Rc;

use kaze_syntax::ast::{Expr, InfixOp, PrefixOp, Program, Stmt};
use kaze_syntax::error::{error, Error, Result};

use crate::builtins;
use crate::env::Environment;
use crate::flow::Flow;
use crate::lvalue::LValue;
use crate::value::{Function, HashPair, Value};

/// String allocation counters, surfaced by the REPL's `:mem` command.
#[derive(Default, Debug, Clone)]
pub struct MemoryStats {
    /// Number of string values allocated during evaluation
    pub strings_allocated: usize,
    /// Total bytes allocated for string storage
    pub bytes_allocated: usize,
}

/// Evaluate a sub-expression to a plain value; any control carrier
/// (return/break/continue) is passed through to the caller unchanged.
macro_rules! eval_value {
    ($self:ident, $env:expr, $expr:expr) => {
        match $self.eval_expr($env, $expr)? {
            Flow::Value(v) => v,
            flow => return Ok(flow),
        }
    };
}

pub struct Interpreter {
    mem: MemoryStats,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            mem: MemoryStats::default(),
        }
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.mem.clone()
    }

    pub fn reset(&mut self) {
        self.mem = MemoryStats::default();
    }

    /// Run a program in a fresh root environment.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        let env = Environment::new();
        self.run_with_env(program, &env)
    }

    /// Run a program against an existing environment (REPL persistence).
    ///
    /// A top-level `return` unwraps to its payload and ends the program;
    /// `break`/`continue` escaping every loop is an error. The result is the
    /// value of the last executed statement.
    pub fn run_with_env(&mut self, program: &Program, env: &Rc<Environment>) -> Result<Value> {
        let mut last = Value::Null;
        for stmt in &program.statements {
            match self.exec_stmt(env, stmt)? {
                Flow::Value(v) => last = v,
                Flow::Return(v) => return Ok(v),
                Flow::Break => return error("'break' outside of loop"),
                Flow::Continue => return error("'continue' outside of loop"),
            }
        }
        Ok(last)
    }

    fn exec_stmt(&mut self, env: &Rc<Environment>, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Var { name, value } => {
                let v = eval_value!(self, env, value);
                env.create(name.clone(), v);
                Ok(Flow::Value(Value::Null))
            }
            Stmt::Return(value) => {
                let v = match value {
                    Some(e) => eval_value!(self, env, e),
                    None => Value::Null,
                };
                Ok(Flow::Return(v))
            }
            Stmt::FunctionDef { name, params, body } => {
                // the closure captures the defining environment; the name is
                // bound in that same environment, which makes recursion work
                let function = Value::Function(Rc::new(Function {
                    params: params.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                }));
                env.create(name.clone(), function);
                Ok(Flow::Value(Value::Null))
            }
            Stmt::While { cond, body } => self.exec_while(env, cond, body),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Expr(e) => self.eval_expr(env, e),
        }
    }

    fn exec_while(&mut self, env: &Rc<Environment>, cond: &Expr, body: &Expr) -> Result<Flow> {
        loop {
            let c = eval_value!(self, env, cond);
            if !c.is_truthy() {
                break;
            }
            match self.eval_expr(env, body)? {
                Flow::Value(_) => {}
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Break => break,
                Flow::Continue => continue,
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    fn eval_expr(&mut self, env: &Rc<Environment>, expr: &Expr) -> Result<Flow> {
        match expr {
            Expr::Int(n) => Ok(Flow::Value(Value::Int(*n))),
            Expr::Bool(b) => Ok(Flow::Value(Value::Bool(*b))),
            Expr::Str(s) => {
                self.record_string(s);
                Ok(Flow::Value(Value::Str(s.clone())))
            }
            Expr::Null => Ok(Flow::Value(Value::Null)),
            Expr::Ident(name) => self.eval_identifier(env, name),
            Expr::Prefix { op, right } => {
                let right = eval_value!(self, env, right);
                Ok(Flow::Value(eval_prefix(*op, right)?))
            }
            Expr::Infix { op, left, right } => self.eval_infix_expr(env, *op, left, right),
            Expr::Assign { target, value } => self.eval_assign(env, target, value),
            Expr::Block(stmts) => self.eval_block(env, stmts),
            Expr::Call { callee, args } => self.eval_call(env, callee, args),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                let c = eval_value!(self, env, cond);
                if c.is_truthy() {
                    self.eval_expr(env, consequence)
                } else if let Some(alt) = alternative {
                    self.eval_expr(env, alt)
                } else {
                    Ok(Flow::Value(Value::Null))
                }
            }
            Expr::Index { left, index } => {
                let left = eval_value!(self, env, left);
                let index = eval_value!(self, env, index);
                Ok(Flow::Value(self.eval_index(left, index)?))
            }
            Expr::Hash(pairs) => self.eval_hash_literal(env, pairs),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(eval_value!(self, env, e));
                }
                Ok(Flow::Value(Value::array(values)))
            }
        }
    }

    fn eval_identifier(&mut self, env: &Rc<Environment>, name: &str) -> Result<Flow> {
        if let Some(v) = env.get(name) {
            return Ok(Flow::Value(v));
        }
        if let Some(b) = builtins::lookup(name) {
            return Ok(Flow::Value(Value::Builtin(b)));
        }
        error(format!("identifier not found: {}", name))
    }

    /// Blocks introduce a new scope and evaluate to the value of their last
    /// executed statement (null when empty or ending in a declaration).
    fn eval_block(&mut self, env: &Rc<Environment>, stmts: &[Stmt]) -> Result<Flow> {
        let scope = Environment::new_enclosed(env);
        let mut last = Value::Null;
        for stmt in stmts {
            match self.exec_stmt(&scope, stmt)? {
                Flow::Value(v) => last = v,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Value(last))
    }

    /// `&&` and `||` operate on truthiness, short-circuit, and always return
    /// a boolean rather than an operand.
    fn eval_infix_expr(
        &mut self,
        env: &Rc<Environment>,
        op: InfixOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Flow> {
        match op {
            InfixOp::And => {
                let l = eval_value!(self, env, left);
                if !l.is_truthy() {
                    return Ok(Flow::Value(Value::Bool(false)));
                }
                let r = eval_value!(self, env, right);
                Ok(Flow::Value(Value::Bool(r.is_truthy())))
            }
            InfixOp::Or => {
                let l = eval_value!(self, env, left);
                if l.is_truthy() {
                    return Ok(Flow::Value(Value::Bool(true)));
                }
                let r = eval_value!(self, env, right);
                Ok(Flow::Value(Value::Bool(r.is_truthy())))
            }
            _ => {
                let l = eval_value!(self, env, left);
                let r = eval_value!(self, env, right);
                Ok(Flow::Value(self.eval_infix(op, l, r)?))
            }
        }
    }

    fn eval_infix(&mut self, op: InfixOp, left: Value, right: Value) -> Result<Value> {
        match (&left, &right) {
            (Value::NaN, Value::Int(_)) | (Value::Int(_), Value::NaN) | (Value::NaN, Value::NaN) => {
                Ok(Value::NaN)
            }
            (Value::Int(a), Value::Int(b)) => eval_integer_infix(op, *a, *b),
            (Value::Str(a), Value::Str(b)) => self.eval_string_infix(op, a, b),
            _ => match op {
                InfixOp::Eq => Ok(Value::Bool(left.deep_eq(&right))),
                InfixOp::NotEq => Ok(Value::Bool(!left.deep_eq(&right))),
                _ if left.type_name() != right.type_name() => error(format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                )),
                _ => error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                )),
            },
        }
    }

    fn eval_string_infix(&mut self, op: InfixOp, a: &str, b: &str) -> Result<Value> {
        Ok(match op {
            InfixOp::Add => {
                let s = format!("{}{}", a, b);
                self.record_string(&s);
                Value::Str(s)
            }
            InfixOp::Lt => Value::Bool(a < b),
            InfixOp::Gt => Value::Bool(a > b),
            InfixOp::Le => Value::Bool(a <= b),
            InfixOp::Ge => Value::Bool(a >= b),
            InfixOp::Eq => Value::Bool(a == b),
            InfixOp::NotEq => Value::Bool(a != b),
            _ => return error(format!("unknown operator: STRING {} STRING", op)),
        })
    }

    /// Assignment: resolve the target to an lvalue, evaluate the value, and
    /// write through. The assignment expression yields the written value.
    fn eval_assign(&mut self, env: &Rc<Environment>, target: &Expr, value: &Expr) -> Result<Flow> {
        let lvalue = self.build_lvalue(env, target)?;
        let v = eval_value!(self, env, value);
        Ok(Flow::Value(lvalue.update(v)?))
    }

    fn build_lvalue(&mut self, env: &Rc<Environment>, expr: &Expr) -> Result<LValue> {
        match expr {
            Expr::Ident(name) => Ok(LValue::Binding {
                name: name.clone(),
                env: Rc::clone(env),
            }),
            Expr::Index { left, index } => {
                let parent = self.build_lvalue(env, left)?;
                let index = match self.eval_expr(env, index)? {
                    Flow::Value(v) => v,
                    _ => return error("assignment failed"),
                };
                Ok(LValue::IndexRef {
                    parent: Box::new(parent),
                    index,
                })
            }
            other => error(format!("not an lvalue: {}", other)),
        }
    }

    fn eval_call(&mut self, env: &Rc<Environment>, callee: &Expr, args: &[Expr]) -> Result<Flow> {
        let callee = eval_value!(self, env, callee);
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(eval_value!(self, env, arg));
        }
        self.apply_function(callee, values)
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> Result<Flow> {
        match callee {
            Value::Builtin(b) => Ok(Flow::Value((b.func)(&args)?)),
            Value::Function(func) => {
                if func.params.len() != args.len() {
                    return error(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        func.params.len()
                    ));
                }
                let scope = Environment::new_enclosed(&func.env);
                for (param, arg) in func.params.iter().zip(args) {
                    scope.create(param.clone(), arg);
                }
                match self.eval_expr(&scope, &func.body)? {
                    Flow::Value(v) | Flow::Return(v) => Ok(Flow::Value(v)),
                    Flow::Break => error("'break' outside of loop"),
                    Flow::Continue => error("'continue' outside of loop"),
                }
            }
            other => error(format!("not a function: {}", other.type_name())),
        }
    }

    fn eval_index(&mut self, left: Value, index: Value) -> Result<Value> {
        match (&left, &index) {
            // byte-level indexing; a byte that is not valid UTF-8 on its own
            // becomes the replacement character
            (Value::Str(s), Value::Int(n)) => {
                if *n < 0 || (*n as usize) >= s.len() {
                    return error(format!("index out of range: {}", n));
                }
                let b = s.as_bytes()[*n as usize];
                let ch = String::from_utf8_lossy(&[b]).into_owned();
                self.record_string(&ch);
                Ok(Value::Str(ch))
            }
            (Value::Array(elements), Value::Int(n)) => {
                let elements = elements.borrow();
                if *n < 0 || (*n as usize) >= elements.len() {
                    return error(format!("index out of range: {}", n));
                }
                Ok(elements[*n as usize].clone())
            }
            // a missing hash key reads as null; only unhashable keys error
            (Value::Hash(pairs), _) => {
                let key = index
                    .hash_key()
                    .ok_or_else(|| Error::new(format!("unusable as hash key: {}", index.type_name())))?;
                Ok(pairs
                    .borrow()
                    .get(&key)
                    .map(|p| p.value.clone())
                    .unwrap_or(Value::Null))
            }
            _ => error(format!("index operator not supported: {}", left.type_name())),
        }
    }

    /// Keys and values evaluate in source order; later duplicate keys
    /// overwrite earlier ones.
    fn eval_hash_literal(&mut self, env: &Rc<Environment>, pairs: &[(Expr, Expr)]) -> Result<Flow> {
        let mut map = HashMap::new();
        for (key_expr, value_expr) in pairs {
            let key = eval_value!(self, env, key_expr);
            let value = eval_value!(self, env, value_expr);
            let hashed = key
                .hash_key()
                .ok_or_else(|| Error::new(format!("unusable as hash key: {}", key.type_name())))?;
            map.insert(hashed, HashPair { key, value });
        }
        Ok(Flow::Value(Value::hash(map)))
    }

    fn record_string(&mut self, s: &str) {
        self.mem.strings_allocated += 1;
        self.mem.bytes_allocated += s.len();
    }
}

fn eval_prefix(op: PrefixOp, right: Value) -> Result<Value> {
    match op {
        PrefixOp::Not => Ok(Value::Bool(!right.is_truthy())),
        PrefixOp::Neg => match right {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
            Value::NaN => Ok(Value::NaN),
            other => error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_integer_infix(op: InfixOp, a: i64, b: i64) -> Result<Value> {
    Ok(match op {
        InfixOp::Add => Value::Int(a.wrapping_add(b)),
        InfixOp::Sub => Value::Int(a.wrapping_sub(b)),
        InfixOp::Mul => Value::Int(a.wrapping_mul(b)),
        InfixOp::Div => {
            if b == 0 {
                return error("division by zero");
            }
            Value::Int(a.wrapping_div(b))
        }
        InfixOp::Lt => Value::Bool(a < b),
        InfixOp::Gt => Value::Bool(a > b),
        InfixOp::Le => Value::Bool(a <= b),
        InfixOp::Ge => Value::Bool(a >= b),
        InfixOp::Eq => Value::Bool(a == b),
        InfixOp::NotEq => Value::Bool(a != b),
        InfixOp::And | InfixOp::Or => {
            return error(format!("unknown operator: INTEGER {} INTEGER", op))
        }
    })
}
