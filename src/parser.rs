//! The parser algebra.
//!
//! A [`Parser`] is an immutable tree of combinator nodes behind a reference
//! counted handle: cloning is cheap, and every combinator returns a new node
//! without touching its operands. Evaluation (see [`Parser::call`]) walks the
//! tree against a [`TokenStream`], recording consumption in a
//! [`ParseBuffer`] so that choice points can undo failed attempts.
//!
//! Result shapes
//!
//!     Terminal, Any           [token]
//!     Empty, None             [nil]
//!     Concat                  left ++ right (always flat)
//!     Action                  [f(result)]
//!     Iteration               [[r1], [r2], ...] wrapped in one list
//!     Parallel                [[left, nil]] or [[nil, right]]
//!     Negative                [[tokens the failed attempt consumed]]
//!     Condition, State        [value]
//!
//! Concatenation is kept right-associated: `a - b - c` is stored as
//! `a - (b - c)`. The choice optimizer relies on that shape to find shared
//! prefixes.

mod eval;
pub mod ops;
pub mod optimize;

use crate::buffer::ParseBuffer;
use crate::capture::{Captures, Labels, Stack};
use crate::config::Options;
use crate::grammar::RuleRef;
use crate::matcher::{Equality, Matcher};
use crate::stream::TokenStream;
use crate::symbol::Symbol;
use crate::value::{Seq, Value};
use std::fmt;
use std::ops::{Bound, Deref, RangeBounds};
use std::rc::Rc;
use tracing::trace;

pub(crate) type Transform<T> = Rc<dyn Fn(Matched<T>) -> Seq<T>>;
pub(crate) type Predicate<T> = Rc<dyn Fn(&mut Labels<T>) -> Value<T>>;

pub struct Parser<T> {
    node: Rc<Node<T>>,
}

pub(crate) enum Node<T> {
    Terminal(Matcher<T>),
    Rule(RuleRef<T>),
    Action(Parser<T>, Transform<T>),
    Label(Parser<T>, String),
    Snapshot(Parser<T>, String),
    Push(Parser<T>, Stack<T>),
    Concat(Parser<T>, Parser<T>),
    Choice(Parser<T>, Parser<T>),
    Parallel(Parser<T>, Parser<T>),
    Iteration {
        child: Parser<T>,
        min: usize,
        max: Option<usize>,
    },
    Negative(Parser<T>),
    Fail,
    Empty,
    Any,
    None,
    Backref(String, Equality),
    StackRef(Stack<T>, Equality),
    Condition(Predicate<T>),
    State(Value<T>),
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Symbol> Parser<T> {
    pub(crate) fn from_node(node: Node<T>) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &Node<T> {
        &self.node
    }

    /// Visit every rule reference in this tree without resolving it.
    pub(crate) fn for_each_rule(&self, f: &mut dyn FnMut(&RuleRef<T>)) {
        match self.node() {
            Node::Rule(rule) => f(rule),
            Node::Action(child, _)
            | Node::Label(child, _)
            | Node::Snapshot(child, _)
            | Node::Push(child, _)
            | Node::Negative(child)
            | Node::Iteration { child, .. } => child.for_each_rule(f),
            Node::Concat(a, b) | Node::Choice(a, b) | Node::Parallel(a, b) => {
                a.for_each_rule(f);
                b.for_each_rule(f);
            }
            _ => {}
        }
    }

    /// A terminal accepting one symbol the matcher approves.
    pub fn terminal(matcher: impl Into<Matcher<T>>) -> Self {
        Self::from_node(Node::Terminal(matcher.into()))
    }

    /// Sequence: `self` then `other`, results concatenated.
    pub fn concat(self, other: Parser<T>) -> Self {
        match &*self.node {
            Node::Concat(head, tail) => {
                Self::from_node(Node::Concat(head.clone(), tail.clone().concat(other)))
            }
            _ => Self::from_node(Node::Concat(self, other)),
        }
    }

    /// Ordered choice, factoring a shared prefix out of both alternatives
    /// when there is one.
    pub fn or(self, other: Parser<T>) -> Self {
        optimize::factor(&self, &other).unwrap_or_else(|| Self::or_unoptimized(self, other))
    }

    /// Ordered choice exactly as written; see [`Parser::optimize`].
    pub fn or_unoptimized(self, other: Parser<T>) -> Self {
        Self::from_node(Node::Choice(self, other))
    }

    /// Try `self`, fall back to `other`, remembering which side matched.
    pub fn parallel(self, other: Parser<T>) -> Self {
        Self::from_node(Node::Parallel(self, other))
    }

    /// Greedy repetition with the count constrained to `range`.
    pub fn repeat(self, range: impl RangeBounds<usize>) -> Self {
        let min = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let max = match range.end_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n.saturating_sub(1)),
            Bound::Unbounded => None,
        };
        Self::from_node(Node::Iteration {
            child: self,
            min,
            max,
        })
    }

    /// Zero or more repetitions.
    pub fn many(self) -> Self {
        self.repeat(..)
    }

    /// At least `min` repetitions.
    pub fn at_least(self, min: usize) -> Self {
        self.repeat(min..)
    }

    /// Zero or one occurrence.
    pub fn optional(self) -> Self {
        self.repeat(..=1)
    }

    /// Negative lookahead: succeeds, consuming nothing, iff `self` fails.
    pub fn negate(self) -> Self {
        Self::from_node(Node::Negative(self))
    }

    /// Semantic action over the matched sequence.
    pub fn map<F, V>(self, f: F) -> Self
    where
        F: Fn(Matched<T>) -> V + 'static,
        V: Into<Value<T>>,
    {
        let transform: Transform<T> = Rc::new(move |matched: Matched<T>| vec![f(matched).into()]);
        Self::from_node(Node::Action(self, transform))
    }

    /// Record the result (or its failure) under `name` in the label map.
    pub fn label(self, name: impl Into<String>) -> Self {
        Self::from_node(Node::Label(self, name.into()))
    }

    /// Record the symbols consumed so far in the current attempt under
    /// `name`, then evaluate `self`.
    pub fn snapshot(self, name: impl Into<String>) -> Self {
        Self::from_node(Node::Snapshot(self, name.into()))
    }

    /// Push the result (or its failure) onto `stack`.
    pub fn stack_push(self, stack: &Stack<T>) -> Self {
        Self::from_node(Node::Push(self, stack.clone()))
    }

    /// Parse `tokens` from the start; see [`Parser::parse_stream`].
    pub fn parse<I>(&self, tokens: I) -> Option<Value<T>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let mut stream = TokenStream::new(tokens);
        self.parse_stream(&mut stream)
    }

    /// Parse from the front of `stream` and return the first element of the
    /// result sequence. Whatever the parser did not consume stays in the
    /// stream.
    pub fn parse_stream(&self, stream: &mut TokenStream<T>) -> Option<Value<T>> {
        self.parse_sequence(stream)
            .map(|seq| seq.into_iter().next().unwrap_or(Value::Nil))
    }

    /// Parse with default [`Options`] and return the whole result sequence.
    pub fn parse_sequence(&self, stream: &mut TokenStream<T>) -> Option<Seq<T>> {
        self.parse_with(stream, &Captures::new(), &Options::default())
    }

    /// Top-level driver. Labels land in `captures`, so the caller can
    /// inspect them afterwards.
    pub fn parse_with(
        &self,
        stream: &mut TokenStream<T>,
        captures: &Captures<T>,
        options: &Options,
    ) -> Option<Seq<T>> {
        trace!(parser = %self, "parse started");
        let mut buffer = ParseBuffer::with_captures(captures.clone());
        match self.call(stream, &mut buffer) {
            Some(result) => {
                trace!(consumed = buffer.len(), "parse succeeded");
                Some(result)
            }
            None => {
                let consumed = buffer.len();
                if options.restore_on_failure {
                    buffer.recover(stream);
                }
                trace!(consumed, restored = options.restore_on_failure, "parse failed");
                None
            }
        }
    }
}

/// A single-symbol terminal.
pub fn token<T: Symbol>(matcher: impl Into<Matcher<T>>) -> Parser<T> {
    Parser::terminal(matcher)
}

/// A terminal accepting any symbol of the given kind.
pub fn kind<T: Symbol>(kind: impl Into<String>) -> Parser<T> {
    Parser::terminal(Matcher::Kind(kind.into()))
}

/// Accept exactly one symbol, whatever it is.
pub fn any<T: Symbol>() -> Parser<T> {
    Parser::from_node(Node::Any)
}

/// Succeed only at end of input.
pub fn none<T: Symbol>() -> Parser<T> {
    Parser::from_node(Node::None)
}

/// Always succeed without consuming.
pub fn empty<T: Symbol>() -> Parser<T> {
    Parser::from_node(Node::Empty)
}

/// Never succeed.
pub fn fail<T: Symbol>() -> Parser<T> {
    Parser::from_node(Node::Fail)
}

pub fn concat<T: Symbol>(left: Parser<T>, right: Parser<T>) -> Parser<T> {
    left.concat(right)
}

pub fn choice<T: Symbol>(left: Parser<T>, right: Parser<T>) -> Parser<T> {
    left.or(right)
}

pub fn parallel<T: Symbol>(left: Parser<T>, right: Parser<T>) -> Parser<T> {
    left.parallel(right)
}

pub fn negate<T: Symbol>(parser: Parser<T>) -> Parser<T> {
    parser.negate()
}

/// Require the upcoming input to repeat what `label` captured.
pub fn backref<T: Symbol>(label: impl Into<String>) -> Parser<T> {
    backref_with(label, Equality::default())
}

pub fn backref_with<T: Symbol>(label: impl Into<String>, equality: Equality) -> Parser<T> {
    Parser::from_node(Node::Backref(label.into(), equality))
}

/// Pop the top of `stack` and require the upcoming input to repeat it.
pub fn stackref<T: Symbol>(stack: &Stack<T>) -> Parser<T> {
    stackref_with(stack, Equality::default())
}

pub fn stackref_with<T: Symbol>(stack: &Stack<T>, equality: Equality) -> Parser<T> {
    Parser::from_node(Node::StackRef(stack.clone(), equality))
}

/// Zero-width test over the label map; the returned value becomes the
/// result when truthy.
pub fn condition<T, F, V>(f: F) -> Parser<T>
where
    T: Symbol,
    F: Fn(&mut Labels<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    let predicate: Predicate<T> = Rc::new(move |labels: &mut Labels<T>| f(labels).into());
    Parser::from_node(Node::Condition(predicate))
}

/// Zero-width gate on the reserved state slot.
pub fn state<T: Symbol>(expected: impl Into<Value<T>>) -> Parser<T> {
    Parser::from_node(Node::State(expected.into()))
}

/// What a semantic action receives: the matched sequence plus access to the
/// parse's captures.
pub struct Matched<T> {
    values: Seq<T>,
    captures: Captures<T>,
}

impl<T: Clone> Matched<T> {
    pub fn new(values: Seq<T>, captures: Captures<T>) -> Self {
        Self { values, captures }
    }

    /// The value captured under `name`, if any.
    pub fn label(&self, name: &str) -> Option<Value<T>> {
        self.captures.get(name)
    }

    pub fn state(&self) -> Value<T> {
        self.captures.state()
    }

    pub fn captures(&self) -> &Captures<T> {
        &self.captures
    }

    pub fn values(&self) -> &Seq<T> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Seq<T> {
        &mut self.values
    }

    pub fn into_values(self) -> Seq<T> {
        self.values
    }
}

impl<T> Deref for Matched<T> {
    type Target = [Value<T>];

    fn deref(&self) -> &[Value<T>] {
        &self.values
    }
}

impl<T: fmt::Debug> fmt::Debug for Matched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl<T: Symbol> fmt::Display for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            Node::Terminal(m) => write!(f, "{}", m),
            Node::Rule(rule) => write!(f, "{}", rule),
            Node::Action(child, _) => write!(f, "({} <action>)", child),
            Node::Label(child, name) => write!(f, "({}/{})", child, name),
            Node::Snapshot(child, name) => write!(f, "({}>{})", child, name),
            Node::Push(child, stack) => write!(f, "({}%<stack:{:x}>)", child, stack.id()),
            Node::Concat(a, b) => write!(f, "({} {})", a, b),
            Node::Choice(a, b) => write!(f, "({} | {})", a, b),
            Node::Parallel(a, b) => write!(f, "({} + {})", a, b),
            Node::Iteration { child, min, max } => match max {
                Some(max) => write!(f, "({})*{}..{}", child, min, max),
                None => write!(f, "({})*{}", child, min),
            },
            Node::Negative(child) => write!(f, "~{}", child),
            Node::Fail => write!(f, "<fail>"),
            Node::Empty => write!(f, "<empty>"),
            Node::Any => write!(f, "<any>"),
            Node::None => write!(f, "<none>"),
            Node::Backref(name, _) => write!(f, "<backref:{}>", name),
            Node::StackRef(stack, _) => write!(f, "<stackref:{:x}>", stack.id()),
            Node::Condition(_) => write!(f, "<condition>"),
            Node::State(state) => write!(f, "<state:{}>", state),
        }
    }
}

impl<T: Symbol> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chars, tok};

    #[test]
    fn test_concat_is_right_associated() {
        let p: Parser<String> = token("a") - token("b") - token("c");
        match p.node() {
            Node::Concat(head, tail) => {
                assert!(matches!(head.node(), Node::Terminal(_)));
                assert!(matches!(tail.node(), Node::Concat(_, _)));
            }
            _ => panic!("expected a concatenation"),
        }
        assert_eq!(p.to_string(), "(a (b c))");
    }

    #[test]
    fn test_repeat_bounds() {
        let p: Parser<String> = token("a").repeat(2..=4);
        assert!(matches!(p.node(), Node::Iteration { min: 2, max: Some(4), .. }));
        let p: Parser<String> = token("a").repeat(1..3);
        assert!(matches!(p.node(), Node::Iteration { min: 1, max: Some(2), .. }));
        let p: Parser<String> = token("a").many();
        assert!(matches!(p.node(), Node::Iteration { min: 0, max: None, .. }));
    }

    #[test]
    fn test_parse_returns_first_element() {
        let p: Parser<String> = token("a") - token("b");
        assert_eq!(p.parse(chars("ab")), Some(tok("a")));
    }

    #[test]
    fn test_failed_parse_restores_stream() {
        let p: Parser<String> = token("a") - token("b");
        let mut ts = TokenStream::new(chars("ac"));
        assert_eq!(p.parse_stream(&mut ts), None);
        assert_eq!(ts.remaining(), chars("ac"));
    }

    #[test]
    fn test_failed_parse_can_leave_stream_advanced() {
        let p: Parser<String> = token("a") - token("b");
        let mut ts = TokenStream::new(chars("acd"));
        let options = Options {
            restore_on_failure: false,
            ..Options::default()
        };
        assert_eq!(p.parse_with(&mut ts, &Captures::new(), &options), None);
        assert_eq!(ts.remaining(), chars("d"));
    }

    #[test]
    fn test_labels_are_visible_to_caller() {
        let p: Parser<String> = token("a").label("first") - token("b");
        let captures = Captures::new();
        let mut ts = TokenStream::new(chars("ab"));
        assert!(p.parse_with(&mut ts, &captures, &Options::default()).is_some());
        assert_eq!(captures.get("first"), Some(Value::List(vec![tok("a")])));
    }
}
