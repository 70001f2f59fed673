//! Structural equivalence and choice factoring.
//!
//! Two alternatives that start with structurally identical parsers are
//! rewritten so the shared prefix is parsed once:
//!
//!     (A B) | (A C)   =>   A (B + C)
//!
//! The parallel node remembers which tail matched, and a dispatch action
//! reshapes the result into what the original alternative would have
//! produced, applying that alternative's own action if it had one. The
//! rewritten parser therefore accepts the same language and yields the same
//! values as the plain choice.

use super::{Matched, Node, Parser, Transform};
use crate::symbol::Symbol;
use crate::value::{Seq, Value};
use std::rc::Rc;
use tracing::debug;

impl<T: Symbol> Parser<T> {
    /// Structural equivalence. Nodes holding user closures, stacks or
    /// constants are never the same as anything, including themselves.
    pub fn same(&self, other: &Parser<T>) -> bool {
        match (self.node(), other.node()) {
            (Node::Terminal(a), Node::Terminal(b)) => a.same(b),
            (Node::Rule(a), Node::Rule(b)) => a.same(b),
            (Node::Label(a, x), Node::Label(b, y)) => x == y && a.same(b),
            (Node::Snapshot(a, x), Node::Snapshot(b, y)) => x == y && a.same(b),
            (Node::Concat(a1, a2), Node::Concat(b1, b2))
            | (Node::Choice(a1, a2), Node::Choice(b1, b2))
            | (Node::Parallel(a1, a2), Node::Parallel(b1, b2)) => a1.same(b1) && a2.same(b2),
            (
                Node::Iteration { child: a, min: amin, max: amax },
                Node::Iteration { child: b, min: bmin, max: bmax },
            ) => amin == bmin && amax == bmax && a.same(b),
            (Node::Negative(a), Node::Negative(b)) => a.same(b),
            (Node::Fail, Node::Fail)
            | (Node::Empty, Node::Empty)
            | (Node::Any, Node::Any)
            | (Node::None, Node::None) => true,
            _ => false,
        }
    }

    /// True if a snapshot appears anywhere in this tree, rule bodies aside.
    fn has_snapshot(&self) -> bool {
        match self.node() {
            Node::Snapshot(..) => true,
            Node::Action(child, _)
            | Node::Label(child, _)
            | Node::Push(child, _)
            | Node::Negative(child)
            | Node::Iteration { child, .. } => child.has_snapshot(),
            Node::Concat(a, b) | Node::Choice(a, b) | Node::Parallel(a, b) => {
                a.has_snapshot() || b.has_snapshot()
            }
            _ => false,
        }
    }

    /// Factor shared prefixes out of every choice in the tree. Rule
    /// references are left alone; their bodies are optimized where they are
    /// defined.
    pub fn optimize(&self) -> Parser<T> {
        self.rewrite()
    }

    fn rewrite(&self) -> Parser<T> {
        let node = match self.node() {
            Node::Choice(a, b) => {
                let (a, b) = (a.rewrite(), b.rewrite());
                return factor(&a, &b).unwrap_or_else(|| a.or_unoptimized(b));
            }
            Node::Action(child, f) => Node::Action(child.rewrite(), Rc::clone(f)),
            Node::Label(child, name) => Node::Label(child.rewrite(), name.clone()),
            Node::Snapshot(child, name) => Node::Snapshot(child.rewrite(), name.clone()),
            Node::Push(child, stack) => Node::Push(child.rewrite(), stack.clone()),
            Node::Concat(a, b) => Node::Concat(a.rewrite(), b.rewrite()),
            Node::Parallel(a, b) => Node::Parallel(a.rewrite(), b.rewrite()),
            Node::Iteration { child, min, max } => Node::Iteration {
                child: child.rewrite(),
                min: *min,
                max: *max,
            },
            Node::Negative(child) => Node::Negative(child.rewrite()),
            _ => return self.clone(),
        };
        Parser::from_node(node)
    }
}

/// Rewrite `left | right` around their shared prefix, or `None` when the
/// alternatives have nothing in common.
pub(crate) fn factor<T: Symbol>(left: &Parser<T>, right: &Parser<T>) -> Option<Parser<T>> {
    let (left_body, left_action) = split_action(left);
    let (right_body, right_action) = split_action(right);
    // snapshots see the tokens of their save-point, and factoring moves those
    if left_body.has_snapshot() || right_body.has_snapshot() {
        return None;
    }
    let (shared, left_tail, right_tail) = shared_prefix(&left_body, &right_body)?;
    debug!(prefix = %shared, "factored shared prefix out of choice");
    let body = shared.concat(left_tail.parallel(right_tail));
    let reshape: Transform<T> =
        Rc::new(move |matched: Matched<T>| dispatch(matched, &left_action, &right_action));
    Some(Parser::from_node(Node::Action(body, reshape)))
}

fn split_action<T: Symbol>(parser: &Parser<T>) -> (Parser<T>, Option<Transform<T>>) {
    match parser.node() {
        Node::Action(child, f) => (child.clone(), Some(Rc::clone(f))),
        _ => (parser.clone(), None),
    }
}

/// Longest common run of leading elements of two right-associated
/// concatenations, with what is left of each side.
fn shared_prefix<T: Symbol>(
    left: &Parser<T>,
    right: &Parser<T>,
) -> Option<(Parser<T>, Parser<T>, Parser<T>)> {
    let (Node::Concat(lhead, ltail), Node::Concat(rhead, rtail)) = (left.node(), right.node()) else {
        return None;
    };
    if !lhead.same(rhead) {
        return None;
    }
    match shared_prefix(ltail, rtail) {
        Some((more, ltail, rtail)) => Some((lhead.clone().concat(more), ltail, rtail)),
        None => Some((lhead.clone(), ltail.clone(), rtail.clone())),
    }
}

/// Undo the parallel wrapping: splice the matched tail back onto the prefix
/// and hand the result to the action of the side that matched.
fn dispatch<T: Symbol>(
    mut matched: Matched<T>,
    left: &Option<Transform<T>>,
    right: &Option<Transform<T>>,
) -> Seq<T> {
    let Some(Value::List(pair)) = matched.values_mut().pop() else {
        return matched.into_values();
    };
    let mut pair = pair.into_iter();
    let (action, tail) = match (pair.next(), pair.next()) {
        (Some(Value::List(tail)), _) => (left, tail),
        (_, Some(Value::List(tail))) => (right, tail),
        _ => return matched.into_values(),
    };
    matched.values_mut().extend(tail);
    match action {
        Some(f) => f(matched),
        None => matched.into_values(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{any, condition, empty, token};
    use crate::testing::{chars, tok};

    fn t(text: &str) -> Parser<String> {
        token(text)
    }

    #[test]
    fn test_same_terminals() {
        assert!(t("a").same(&t("a")));
        assert!(!t("a").same(&t("b")));
        assert!(any::<String>().same(&any()));
        assert!(!any::<String>().same(&empty()));
    }

    #[test]
    fn test_same_recurses_through_composites() {
        let a = t("a") - (t("b") | t("c")).many();
        let b = t("a") - (t("b") | t("c")).many();
        assert!(a.same(&b));
        assert!(!a.same(&(t("a") - (t("b") | t("c")).at_least(1))));
    }

    #[test]
    fn test_closures_are_never_the_same() {
        let p = t("a").map(|_| 1);
        assert!(!p.same(&p));
        let c = condition::<String, _, _>(|_| true);
        assert!(!c.same(&c));
    }

    #[test]
    fn test_factor_display() {
        let p = (t("a") - t("b") - t("c")) | (t("a") - t("b") - t("d"));
        insta::assert_snapshot!(p.to_string(), @"((a (b (c + d))) <action>)");
    }

    #[test]
    fn test_no_shared_prefix_is_plain_choice() {
        let p = (t("a") - t("b")) | (t("c") - t("b"));
        insta::assert_snapshot!(p.to_string(), @"((a b) | (c b))");
    }

    #[test]
    fn test_factored_results_match_plain_choice() {
        let left = t("a") - t("b");
        let right = t("a") - t("c");
        let plain = left.clone().or_unoptimized(right.clone());
        let factored = left | right;
        for input in ["ab", "ac", "ad", "a", ""] {
            let mut s1 = crate::stream::TokenStream::new(chars(input));
            let mut s2 = crate::stream::TokenStream::new(chars(input));
            assert_eq!(plain.parse_sequence(&mut s1), factored.parse_sequence(&mut s2), "{input}");
            assert_eq!(s1.remaining(), s2.remaining());
        }
    }

    #[test]
    fn test_actions_are_dispatched_by_side() {
        let left = (t("a") - t("b")).map(|m| format!("left:{}", m.len()));
        let right = (t("a") - t("c") - t("d")).map(|m| format!("right:{}", m.len()));
        let p = left | right;
        assert_eq!(p.parse(chars("ab")), Some(Value::Str("left:2".into())));
        assert_eq!(p.parse(chars("acd")), Some(Value::Str("right:3".into())));
    }

    #[test]
    fn test_one_sided_action() {
        let left = (t("a") - t("b")).map(|_| 7);
        let right = t("a") - t("c");
        let p = left | right;
        assert_eq!(p.parse(chars("ab")), Some(Value::Int(7)));
        let mut ts = crate::stream::TokenStream::new(chars("ac"));
        assert_eq!(p.parse_sequence(&mut ts), Some(vec![tok("a"), tok("c")]));
    }

    #[test]
    fn test_snapshot_keeps_choice_plain() {
        let seen = |last: &str| {
            (t("a") - t(last).snapshot("s")).map(|m| m.label("s").unwrap_or(Value::Nil))
        };
        let plain = seen("b").or_unoptimized(seen("c"));
        let eager = seen("b") | seen("c");
        insta::assert_snapshot!(eager.to_string(), @"(((a (b>s)) <action>) | ((a (c>s)) <action>))");
        for input in ["ab", "ac"] {
            assert_eq!(eager.parse(chars(input)), plain.parse(chars(input)), "{input}");
        }
        assert_eq!(eager.parse(chars("ab")), Some(Value::List(vec![tok("a")])));
        let deep = plain.optimize();
        assert_eq!(deep.parse(chars("ac")), Some(Value::List(vec![tok("a")])));
    }

    #[test]
    fn test_optimize_is_deep() {
        let inner = (t("x") - t("y")).or_unoptimized(t("x") - t("z"));
        let p = (t("q") - inner).many();
        insta::assert_snapshot!(p.to_string(), @"((q ((x y) | (x z))))*0");
        insta::assert_snapshot!(p.optimize().to_string(), @"((q ((x (y + z)) <action>)))*0");
    }
}
