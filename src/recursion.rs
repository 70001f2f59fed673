//! Left and right folds in place of grammar-level recursion.
//!
//! A top-down parser cannot evaluate a left-recursive rule such as
//! `expr := expr "-" num | num`. [`leftrec`] expresses the same language as
//! `num ("-" num)*` and folds the repetitions onto the base result, so the
//! action sees exactly the arguments the left-recursive rule would have
//! produced. [`chainl`] and [`chainr`] stack these folds into operator
//! precedence levels, tightest first.

use crate::parser::{fail, Matched, Parser};
use crate::symbol::Symbol;
use crate::value::{Seq, Value};
use std::rc::Rc;

type Fold<T> = Rc<dyn Fn(Seq<T>) -> Value<T>>;

fn fold_action<T, F, V>(act: F) -> Fold<T>
where
    T: Symbol,
    F: Fn(Seq<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    Rc::new(move |args: Seq<T>| act(args).into())
}

/// `base tail*` for each tail, folding left: `act([acc, tail items..])`.
/// Later tails are tried first.
pub fn leftrec<T, F, V>(base: Parser<T>, tails: impl IntoIterator<Item = Parser<T>>, act: F) -> Parser<T>
where
    T: Symbol,
    F: Fn(Seq<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    left_folds(base, tails, fold_action(act))
}

/// `head* base` for each head, folding right: `act([head items.., acc])`.
/// Later heads are tried first.
pub fn rightrec<T, F, V>(heads: impl IntoIterator<Item = Parser<T>>, base: Parser<T>, act: F) -> Parser<T>
where
    T: Symbol,
    F: Fn(Seq<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    right_folds(heads, base, fold_action(act))
}

/// Left-associative operator levels over `base`, tightest first.
///
/// The action receives `[left, operator result.., right]`.
pub fn chainl<T, F, V>(base: Parser<T>, infixes: impl IntoIterator<Item = Parser<T>>, act: F) -> Parser<T>
where
    T: Symbol,
    F: Fn(Seq<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    let act = fold_action(act);
    infixes.into_iter().fold(base, |acc, infix| {
        left_folds(acc.clone(), [infix - acc], Rc::clone(&act))
    })
}

/// Right-associative operator levels over `base`, tightest first.
pub fn chainr<T, F, V>(base: Parser<T>, infixes: impl IntoIterator<Item = Parser<T>>, act: F) -> Parser<T>
where
    T: Symbol,
    F: Fn(Seq<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    let act = fold_action(act);
    infixes.into_iter().fold(base, |acc, infix| {
        right_folds([acc.clone() - infix], acc, Rc::clone(&act))
    })
}

fn left_folds<T: Symbol>(base: Parser<T>, tails: impl IntoIterator<Item = Parser<T>>, act: Fold<T>) -> Parser<T> {
    tails
        .into_iter()
        .map(|tail| {
            let act = Rc::clone(&act);
            (base.clone() - tail.many()).map(move |m: Matched<T>| fold_left(m.into_values(), &act))
        })
        .reduce(|acc, alt| alt.or(acc))
        .unwrap_or_else(fail)
}

fn right_folds<T: Symbol>(heads: impl IntoIterator<Item = Parser<T>>, base: Parser<T>, act: Fold<T>) -> Parser<T> {
    heads
        .into_iter()
        .map(|head| {
            let act = Rc::clone(&act);
            (head.many() - base.clone()).map(move |m: Matched<T>| fold_right(m.into_values(), &act))
        })
        .reduce(|acc, alt| alt.or(acc))
        .unwrap_or_else(fail)
}

/// `[base, [[rep1..], [rep2..], ..]]` folded from the left.
fn fold_left<T: Symbol>(mut values: Seq<T>, act: &Fold<T>) -> Value<T> {
    let reps = values.pop().and_then(Value::into_list).unwrap_or_default();
    let mut acc = values.into_iter().next().unwrap_or(Value::Nil);
    for rep in reps {
        let mut args = vec![acc];
        args.extend(rep.into_list().unwrap_or_default());
        acc = act(args);
    }
    acc
}

/// `[[[rep1..], [rep2..], ..], base]` folded from the right.
fn fold_right<T: Symbol>(values: Seq<T>, act: &Fold<T>) -> Value<T> {
    let mut values = values.into_iter();
    let reps = values.next().and_then(Value::into_list).unwrap_or_default();
    let mut acc = values.next().unwrap_or(Value::Nil);
    for rep in reps.into_iter().rev() {
        let mut args = rep.into_list().unwrap_or_default();
        args.push(acc);
        acc = act(args);
    }
    acc
}
