//! Evaluation of parser trees.

use super::{empty, Matched, Node, Parser};
use crate::buffer::ParseBuffer;
use crate::matcher::{Equality, Matcher};
use crate::stream::TokenStream;
use crate::symbol::Symbol;
use crate::value::{Seq, Value};
use tracing::trace;

impl<T: Symbol> Parser<T> {
    /// Evaluate against `stream`, recording consumption in `buffer`.
    ///
    /// Returns `None` when the parser does not match. A failed call may leave
    /// symbols consumed; they are listed in `buffer` and it is up to the
    /// caller (usually an enclosing choice or iteration) to recover them.
    ///
    /// # Panics
    ///
    /// Panics when it reaches a rule reference whose name is undefined or
    /// whose grammar has been dropped.
    pub fn call(&self, stream: &mut TokenStream<T>, buffer: &mut ParseBuffer<T>) -> Option<Seq<T>> {
        match self.node() {
            Node::Terminal(matcher) => {
                let token = stream.shift()?;
                let accepted = matcher.matches(&token);
                buffer.record(token.clone());
                accepted.then(|| vec![Value::Token(token)])
            }
            Node::Any => {
                let token = stream.shift()?;
                buffer.record(token.clone());
                Some(vec![Value::Token(token)])
            }
            Node::None => stream.is_exhausted().then(|| vec![Value::Nil]),
            Node::Empty => Some(vec![Value::Nil]),
            Node::Fail => None,
            Node::Rule(rule) => rule.call(stream, buffer),
            Node::Action(child, transform) => {
                let values = child.call(stream, buffer)?;
                Some(transform(Matched::new(values, buffer.captures().clone())))
            }
            Node::Label(child, name) => {
                let result = child.call(stream, buffer);
                buffer.captures().record(name, result.as_ref());
                result
            }
            Node::Snapshot(child, name) => {
                let seen: Seq<T> = buffer.consumed().iter().cloned().map(Value::Token).collect();
                buffer.captures().labels_mut().set(name.clone(), Value::List(seen));
                child.call(stream, buffer)
            }
            Node::Push(child, stack) => {
                let result = child.call(stream, buffer);
                stack.push(result.clone());
                result
            }
            Node::Concat(left, right) => {
                let mut values = left.call(stream, buffer)?;
                values.extend(right.call(stream, buffer)?);
                Some(values)
            }
            Node::Choice(left, right) => {
                let mut attempt = buffer.prepare();
                match left.call(stream, &mut attempt) {
                    Some(values) => {
                        buffer.commit(attempt);
                        Some(values)
                    }
                    None => {
                        attempt.recover(stream);
                        right.call(stream, buffer)
                    }
                }
            }
            Node::Parallel(left, right) => {
                let mut attempt = buffer.prepare();
                match left.call(stream, &mut attempt) {
                    Some(values) => {
                        buffer.commit(attempt);
                        Some(vec![Value::List(vec![Value::List(values), Value::Nil])])
                    }
                    None => {
                        attempt.recover(stream);
                        let values = right.call(stream, buffer)?;
                        Some(vec![Value::List(vec![Value::Nil, Value::List(values)])])
                    }
                }
            }
            Node::Iteration { child, min, max } => iterate(child, *min, *max, stream, buffer),
            Node::Negative(child) => {
                let mut attempt = buffer.prepare();
                let result = child.call(stream, &mut attempt);
                let consumed: Seq<T> = attempt.consumed().iter().cloned().map(Value::Token).collect();
                attempt.recover(stream);
                match result {
                    Some(_) => None,
                    None => Some(vec![Value::List(consumed)]),
                }
            }
            Node::Backref(name, equality) => {
                let captured = buffer.captures().get(name)?.into_list()?;
                if captured.is_empty() {
                    return None;
                }
                replay(&captured, *equality)?.call(stream, buffer)
            }
            Node::StackRef(stack, equality) => {
                let captured = stack.pop()??;
                if captured.is_empty() {
                    return None;
                }
                replay(&captured, *equality)?.call(stream, buffer)
            }
            Node::Condition(predicate) => {
                let value = {
                    let mut labels = buffer.captures().labels_mut();
                    predicate(&mut *labels)
                };
                value.is_truthy().then(|| vec![value])
            }
            Node::State(expected) => {
                let matches = buffer.captures().labels().state() == expected;
                matches.then(|| vec![expected.clone()])
            }
        }
    }
}

fn iterate<T: Symbol>(
    child: &Parser<T>,
    min: usize,
    max: Option<usize>,
    stream: &mut TokenStream<T>,
    buffer: &mut ParseBuffer<T>,
) -> Option<Seq<T>> {
    let mut results = Vec::new();
    while max.map_or(true, |max| results.len() < max) {
        let revision = buffer.captures().revision();
        let mut attempt = buffer.prepare();
        match child.call(stream, &mut attempt) {
            Some(values) => {
                // neither input nor labels moved: the next round would be identical
                let stalled = attempt.is_empty() && buffer.captures().revision() == revision;
                buffer.commit(attempt);
                results.push(Value::List(values));
                if stalled && results.len() >= min {
                    break;
                }
            }
            None => {
                attempt.recover(stream);
                break;
            }
        }
    }
    if results.len() < min {
        trace!(matched = results.len(), min, "iteration fell short");
        return None;
    }
    Some(vec![Value::List(results)])
}

/// Terminals that re-match a captured sequence, nested lists flattened.
/// `None` if the capture holds something other than symbols.
fn replay<T: Symbol>(captured: &[Value<T>], equality: Equality) -> Option<Parser<T>> {
    let mut terminals = Vec::new();
    collect_terminals(captured, equality, &mut terminals)?;
    let parser = terminals
        .into_iter()
        .rev()
        .reduce(|tail, head| head.concat(tail))
        .unwrap_or_else(empty);
    Some(parser)
}

fn collect_terminals<T: Symbol>(
    captured: &[Value<T>],
    equality: Equality,
    out: &mut Vec<Parser<T>>,
) -> Option<()> {
    for value in captured {
        match value {
            Value::Token(token) => out.push(Parser::terminal(Matcher::Token(token.clone(), equality))),
            Value::List(nested) => collect_terminals(nested, equality, out)?,
            Value::Nil => {}
            _ => return None,
        }
    }
    Some(())
}
