//! Token-driven interpreter state machine.
//!
//! There is no separate syntax-tree phase: each token advances the machine
//! directly toward a value. The machine is either *open* (awaiting a primary
//! token) or *intermediate* (holding a completed operand); suspended outer
//! states live on an explicit frame stack, so nesting depth is bounded only
//! by memory, never by the host call stack.

use std::mem;

use crate::functions::{self, Function};
use crate::ops::{self, Constructor, Op};
use crate::tokenizer::{tokenize, Token};
use crate::workspace::{Error, Item, Name, Response, Value, Workspace};

/// A held operand. Names stay unresolved until they are used as something
/// other than an assignment target.
#[derive(Debug)]
enum Operand {
    Value(Value),
    Name(Name),
}

#[derive(Debug)]
enum State {
    /// Ready for a primary token.
    Open,
    /// A constructor keyword has been read; `(` must follow.
    Construct(Constructor),
    /// Holding a completed operand; ready for an operator, separator or
    /// close.
    Intermediate(Operand),
}

/// A suspended outer state.
#[derive(Debug)]
enum Frame {
    /// Inside `( ... )`.
    Paren,
    /// Inside `{ ... }`, accumulating list elements.
    List(Vec<Item>),
    /// Inside a constructor's `( ... )`, accumulating arguments.
    Args(Constructor, Vec<Value>),
    /// A function keyword awaiting its argument.
    Apply(Function),
    /// A pending binary operation awaiting its right operand.
    Op(Item, Op),
    /// The statement is an assignment to this name.
    Assign(Name),
}

#[derive(Debug)]
struct Machine {
    workspace: Workspace,
    stack: Vec<Frame>,
    state: State,
    /// Return value of the most recent non-empty statement.
    value: Option<Value>,
    /// Whether the current statement has consumed any token.
    touched: bool,
}

impl Machine {
    fn new(workspace: Workspace) -> Self {
        Machine {
            workspace,
            stack: Vec::new(),
            state: State::Open,
            value: None,
            touched: false,
        }
    }

    fn resolve(&self, operand: Operand) -> Result<Value, Error> {
        match operand {
            Operand::Value(value) => Ok(value),
            Operand::Name(name) => self
                .workspace
                .lookup(&name)
                .map(|item| Value::Item(item.clone())),
        }
    }

    /// Resolves the operand and reduces all pending operations on top of
    /// the stack into it.
    fn reduce(&mut self, operand: Operand) -> Result<Value, Error> {
        let mut value = self.resolve(operand)?;
        while let Some(Frame::Op(..)) = self.stack.last() {
            let (lhs, op) = match self.stack.pop() {
                Some(Frame::Op(lhs, op)) => (lhs, op),
                _ => unreachable!(),
            };
            let rhs = value.into_item()?;
            value = Value::Item(ops::apply(op, lhs, rhs)?);
        }
        Ok(value)
    }

    /// Feeds a completed operand back into the machine. Function frames bind
    /// tightest, so they reduce immediately.
    fn complete(&mut self, mut operand: Operand) -> Result<(), Error> {
        while let Some(Frame::Apply(_)) = self.stack.last() {
            let function = match self.stack.pop() {
                Some(Frame::Apply(function)) => function,
                _ => unreachable!(),
            };
            let arg = self.resolve(operand)?;
            operand = Operand::Value(Value::Item(functions::apply(function, arg)?));
        }
        self.state = State::Intermediate(operand);
        Ok(())
    }

    fn primary(&mut self, operand: Operand) -> Result<(), Error> {
        match self.state {
            State::Open => self.complete(operand),
            _ => Err(Error::Format(
                "expected an operator, separator or close".to_owned(),
            )),
        }
    }

    fn read_set(&mut self) -> Result<(), Error> {
        match mem::replace(&mut self.state, State::Open) {
            State::Intermediate(Operand::Name(name)) if self.stack.is_empty() => {
                self.stack.push(Frame::Assign(name));
                Ok(())
            }
            State::Intermediate(Operand::Name(_)) => Err(Error::Format(
                "an assignment must form a whole statement".to_owned(),
            )),
            State::Intermediate(_) => Err(Error::Format(
                "only a name can appear on the left of `=`".to_owned(),
            )),
            _ => Err(Error::Format("`=` without a name before it".to_owned())),
        }
    }

    /// Handles `+`, `*` and `<>`. Pending operations of equal or higher
    /// priority reduce before the new one is suspended.
    fn read_operator(&mut self, op: Op) -> Result<(), Error> {
        let operand = match mem::replace(&mut self.state, State::Open) {
            State::Intermediate(operand) => operand,
            _ => {
                return Err(Error::Format(format!("`{}` without a left operand", op)));
            }
        };
        let mut lhs = self.resolve(operand)?.into_item()?;
        while let Some(Frame::Op(_, held)) = self.stack.last() {
            if held.priority() < op.priority() {
                break;
            }
            let (prev, held) = match self.stack.pop() {
                Some(Frame::Op(prev, held)) => (prev, held),
                _ => unreachable!(),
            };
            lhs = ops::apply(held, prev, lhs)?;
        }
        self.stack.push(Frame::Op(lhs, op));
        Ok(())
    }

    fn read_comma(&mut self) -> Result<(), Error> {
        let operand = match mem::replace(&mut self.state, State::Open) {
            State::Intermediate(operand) => operand,
            _ => return Err(Error::Format("`,` without a value before it".to_owned())),
        };
        let value = self.reduce(operand)?;
        match self.stack.last_mut() {
            Some(Frame::List(items)) => {
                items.push(value.into_item()?);
                Ok(())
            }
            Some(Frame::Args(_, args)) => {
                args.push(value);
                Ok(())
            }
            _ => Err(Error::Format(
                "`,` outside of a list or argument list".to_owned(),
            )),
        }
    }

    fn read_close_paren(&mut self) -> Result<(), Error> {
        let operand = match mem::replace(&mut self.state, State::Open) {
            State::Intermediate(operand) => operand,
            _ => return Err(Error::Format("`)` without a value before it".to_owned())),
        };
        let value = self.reduce(operand)?;
        match self.stack.pop() {
            Some(Frame::Paren) => self.complete(Operand::Value(value)),
            Some(Frame::Args(constructor, mut args)) => {
                args.push(value);
                let item = ops::construct(constructor, args)?;
                self.complete(Operand::Value(Value::Item(item)))
            }
            _ => Err(Error::Format("unmatched `)`".to_owned())),
        }
    }

    fn read_close_brace(&mut self) -> Result<(), Error> {
        let operand = match mem::replace(&mut self.state, State::Open) {
            State::Intermediate(operand) => operand,
            _ => return Err(Error::Format("`}` without a value before it".to_owned())),
        };
        let item = self.reduce(operand)?.into_item()?;
        match self.stack.pop() {
            Some(Frame::List(mut items)) => {
                items.push(item);
                self.complete(Operand::Value(Value::List(items)))
            }
            _ => Err(Error::Format("unmatched `}`".to_owned())),
        }
    }

    /// Handles `;` and end of input: the current statement must either be
    /// empty or hold exactly one completed value with nothing suspended.
    fn finish(&mut self) -> Result<(), Error> {
        if !self.touched {
            return Ok(());
        }
        self.touched = false;
        let result = match mem::replace(&mut self.state, State::Open) {
            State::Open | State::Construct(_) => {
                return Err(Error::Format("incomplete statement".to_owned()));
            }
            State::Intermediate(operand) => {
                let value = self.reduce(operand)?;
                match self.stack.pop() {
                    None => value,
                    Some(Frame::Assign(name)) => {
                        // Assign frames are only ever pushed onto an empty
                        // stack, so this closes the whole statement.
                        let item = value.into_item()?;
                        self.workspace = self.workspace.set(name, item.clone());
                        Value::Item(item)
                    }
                    Some(_) => {
                        return Err(Error::Format("unterminated grouping".to_owned()));
                    }
                }
            }
        };
        self.value = Some(result);
        Ok(())
    }

    fn step(&mut self, token: Token) -> Result<(), Error> {
        match token {
            Token::Separator | Token::Eof => return self.finish(),
            _ => self.touched = true,
        }
        match token {
            Token::Number(n) => self.primary(Operand::Value(Value::Item(Item::Number(n)))),
            Token::Hex(bytes) => self.primary(Operand::Value(Value::Item(Item::Bytes(bytes)))),
            Token::Address(address) => {
                self.primary(Operand::Value(Value::Item(Item::Address(address))))
            }
            Token::Secret(secret) => {
                self.primary(Operand::Value(Value::Item(Item::Secret(secret))))
            }
            Token::Name(name) => self.primary(Operand::Name(name)),

            Token::Function(function) => match self.state {
                State::Open => {
                    self.stack.push(Frame::Apply(function));
                    Ok(())
                }
                _ => Err(Error::Format(format!(
                    "`{}` must begin an expression",
                    function
                ))),
            },

            Token::Constructor(constructor) => match self.state {
                State::Open => {
                    self.state = State::Construct(constructor);
                    Ok(())
                }
                _ => Err(Error::Format(format!(
                    "`{}` must begin an expression",
                    constructor
                ))),
            },

            Token::OpenParen => match mem::replace(&mut self.state, State::Open) {
                State::Open => {
                    self.stack.push(Frame::Paren);
                    Ok(())
                }
                State::Construct(constructor) => {
                    self.stack.push(Frame::Args(constructor, Vec::new()));
                    Ok(())
                }
                State::Intermediate(_) => {
                    Err(Error::Format("unexpected `(` after a value".to_owned()))
                }
            },

            Token::OpenBrace => match self.state {
                State::Open => {
                    self.stack.push(Frame::List(Vec::new()));
                    Ok(())
                }
                _ => Err(Error::Format("unexpected `{` after a value".to_owned())),
            },

            Token::Set => self.read_set(),
            Token::Plus => self.read_operator(Op::Plus),
            Token::Times => self.read_operator(Op::Times),
            Token::Concat => self.read_operator(Op::Concat),
            Token::Comma => self.read_comma(),
            Token::CloseParen => self.read_close_paren(),
            Token::CloseBrace => self.read_close_brace(),

            Token::Separator | Token::Eof => unreachable!(),
        }
    }
}

/// Evaluates statement text against a workspace.
///
/// Statements are separated by `;` and processed in token order, each one
/// threading its resulting workspace into the next. A statement either
/// produces a new workspace, or fails as a whole: on the first error,
/// evaluation stops and the response carries the workspace exactly as it
/// stood before the failing statement began, with no partial writes.
pub fn evaluate(workspace: &Workspace, text: &str) -> Response {
    let tokens = match tokenize(text) {
        Ok(tokens) => tokens,
        Err(error) => return Response::failure(workspace.clone(), error),
    };
    let mut machine = Machine::new(workspace.clone());
    for spanned in tokens {
        if let Err(error) = machine.step(spanned.token) {
            return Response::failure(machine.workspace, error);
        }
    }
    Response::success(machine.workspace, machine.value)
}
