//! Named rules with deferred resolution.
//!
//! A [`Grammar`] maps names to parser definitions. [`Grammar::rule`] hands
//! out a reference that is resolved each time it is evaluated, so rules may
//! refer to themselves, to each other, and to names defined later. A name
//! reachable from the entry rule that is still undefined when the grammar is
//! used is reported by [`Grammar::parser`] before any input is read.
//! Evaluating a reference that cannot be resolved panics.
//!
//! Definitions are either a bound [`Parser`] or a factory that builds one
//! from the reference's arguments. Factories run on every resolution unless
//! [`Options::memoize_rules`] is set.
//!
//! ```text
//! let g = Grammar::new();
//! g.define("list", token("(") - g.rule("elems") - token(")"))?;
//! g.define("elems", (g.rule("list") | kind("word")).many())?;
//! let value = g.parse("list", tokens)?;
//! ```

use crate::buffer::ParseBuffer;
use crate::capture::Captures;
use crate::config::{OptimizeMode, Options};
use crate::error::{Error, Result};
use crate::parser::{token, Node, Parser};
use crate::stream::TokenStream;
use crate::symbol::Symbol;
use crate::value::{Seq, Value};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

type Factory<T> = Rc<dyn Fn(&Grammar<T>, &[Value<T>]) -> Parser<T>>;

enum Definition<T> {
    Bound(Parser<T>),
    Factory {
        build: Factory<T>,
        memo: Vec<(Vec<Value<T>>, Parser<T>)>,
    },
}

struct RuleTable<T> {
    rules: HashMap<String, Definition<T>>,
    options: Options,
}

/// A rule namespace. Clones share the same table.
pub struct Grammar<T> {
    table: Rc<RefCell<RuleTable<T>>>,
}

impl<T: Symbol> Grammar<T> {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let table = RuleTable {
            rules: HashMap::new(),
            options,
        };
        Self {
            table: Rc::new(RefCell::new(table)),
        }
    }

    pub fn options(&self) -> Options {
        self.table.borrow().options.clone()
    }

    /// A reference to `name`, resolved at parse time.
    ///
    /// # Panics
    ///
    /// Evaluating the reference panics if `name` is still undefined, or if
    /// the grammar has been dropped by then. Entering through
    /// [`Grammar::parser`] reports undefined names as errors instead.
    pub fn rule(&self, name: &str) -> Parser<T> {
        self.rule_with(name, Vec::new())
    }

    /// A reference to the factory rule `name`, built with `args`.
    pub fn rule_with(&self, name: &str, args: Vec<Value<T>>) -> Parser<T> {
        Parser::from_node(Node::Rule(RuleRef {
            table: Rc::downgrade(&self.table),
            name: name.to_string(),
            args,
        }))
    }

    /// Bind `name` to `parser`.
    pub fn define(&self, name: &str, parser: Parser<T>) -> Result<()> {
        self.insert(name, Definition::Bound(parser))
    }

    /// Bind `name` to a terminal matching `text`.
    pub fn define_token(&self, name: &str, text: &str) -> Result<()> {
        self.define(name, token(text))
    }

    /// Bind `name` to a factory taking the reference's arguments.
    pub fn define_factory<F>(&self, name: &str, build: F) -> Result<()>
    where
        F: Fn(&Grammar<T>, &[Value<T>]) -> Parser<T> + 'static,
    {
        self.insert(
            name,
            Definition::Factory {
                build: Rc::new(build),
                memo: Vec::new(),
            },
        )
    }

    /// Add `alt` as a further alternative of an existing rule.
    pub fn extend(&self, name: &str, alt: Parser<T>) -> Result<()> {
        let mut table = self.table.borrow_mut();
        let optimize = table.options.optimize;
        let definition = table
            .rules
            .remove(name)
            .ok_or_else(|| Error::UndefinedRule(name.to_string()))?;
        let extended = match definition {
            Definition::Bound(old) => Definition::Bound(alternate(optimize, old, alt)),
            Definition::Factory { build: base, .. } => {
                let build: Factory<T> = Rc::new(move |g: &Grammar<T>, args: &[Value<T>]| {
                    alternate(optimize, base(g, args), alt.clone())
                });
                Definition::Factory {
                    build,
                    memo: Vec::new(),
                }
            }
        };
        table.rules.insert(name.to_string(), extended);
        debug!(rule = name, "rule extended");
        Ok(())
    }

    /// Ordered choice, factored or not depending on [`Options::optimize`].
    pub fn choice(&self, left: Parser<T>, right: Parser<T>) -> Parser<T> {
        alternate(self.table.borrow().options.optimize, left, right)
    }

    /// The parser bound to `name`, if it is a plain definition.
    pub fn get(&self, name: &str) -> Option<Parser<T>> {
        match self.table.borrow().rules.get(name)? {
            Definition::Bound(parser) => Some(parser.clone()),
            Definition::Factory { .. } => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.borrow().rules.contains_key(name)
    }

    /// Defined rule names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.borrow().rules.keys().cloned().collect();
        names.sort();
        names
    }

    /// Fail with the first undefined name referenced by any definition.
    pub fn validate(&self) -> Result<()> {
        self.check_reachable(self.names())
    }

    /// An entry point into the grammar. Fails if `name` or any rule it
    /// reaches through plain definitions is undefined.
    pub fn parser(&self, name: &str) -> Result<Parser<T>> {
        self.check_reachable(vec![name.to_string()])?;
        Ok(self.rule(name))
    }

    /// Walk bound definitions from `roots`. Factory bodies only exist once
    /// built, so references inside them are checked when they are evaluated.
    fn check_reachable(&self, roots: Vec<String>) -> Result<()> {
        let table = self.table.borrow();
        let mut seen = BTreeSet::new();
        let mut pending = roots;
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            match table.rules.get(&name) {
                None => return Err(Error::UndefinedRule(name)),
                Some(Definition::Bound(parser)) => parser.for_each_rule(&mut |rule| {
                    if rule.belongs_to(&self.table) {
                        pending.push(rule.name.clone());
                    }
                }),
                Some(Definition::Factory { .. }) => {}
            }
        }
        Ok(())
    }

    /// Parse `tokens` starting at rule `name`; see [`Parser::parse`].
    pub fn parse<I>(&self, name: &str, tokens: I) -> Result<Option<Value<T>>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let mut stream = TokenStream::new(tokens);
        self.parse_stream(name, &mut stream)
    }

    pub fn parse_stream(&self, name: &str, stream: &mut TokenStream<T>) -> Result<Option<Value<T>>> {
        let parser = self.parser(name)?;
        let options = self.options();
        let result = parser.parse_with(stream, &Captures::new(), &options);
        Ok(result.map(|seq| seq.into_iter().next().unwrap_or(Value::Nil)))
    }

    fn insert(&self, name: &str, definition: Definition<T>) -> Result<()> {
        let mut table = self.table.borrow_mut();
        if table.rules.contains_key(name) {
            return Err(Error::DuplicateRule(name.to_string()));
        }
        table.rules.insert(name.to_string(), definition);
        debug!(rule = name, "rule defined");
        Ok(())
    }
}

fn alternate<T: Symbol>(mode: OptimizeMode, left: Parser<T>, right: Parser<T>) -> Parser<T> {
    match mode {
        OptimizeMode::Eager => left.or(right),
        OptimizeMode::Explicit => left.or_unoptimized(right),
    }
}

impl<T: Symbol> Default for Grammar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Grammar<T> {
    fn clone(&self) -> Self {
        Self {
            table: Rc::clone(&self.table),
        }
    }
}

impl<T> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.borrow();
        let mut names: Vec<&String> = table.rules.keys().collect();
        names.sort();
        f.debug_struct("Grammar")
            .field("rules", &names)
            .field("options", &table.options)
            .finish()
    }
}

/// A named reference into a grammar. Holds the table weakly; evaluating a
/// reference that outlived its grammar panics.
pub(crate) struct RuleRef<T> {
    table: Weak<RefCell<RuleTable<T>>>,
    name: String,
    args: Vec<Value<T>>,
}

impl<T: Symbol> RuleRef<T> {
    pub(crate) fn call(&self, stream: &mut TokenStream<T>, buffer: &mut ParseBuffer<T>) -> Option<Seq<T>> {
        let parser = self.resolve();
        trace!(rule = %self, "rule resolved");
        parser.call(stream, buffer)
    }

    fn resolve(&self) -> Parser<T> {
        let Some(table) = self.table.upgrade() else {
            panic!("rule `{}` evaluated after its grammar was dropped", self);
        };
        let (build, memoize) = {
            let table = table.borrow();
            match table.rules.get(&self.name) {
                None => panic!("undefined rule `{}`", self),
                Some(Definition::Bound(parser)) => return parser.clone(),
                Some(Definition::Factory { build, memo }) => {
                    let memoize = table.options.memoize_rules;
                    if memoize {
                        if let Some((_, parser)) = memo.iter().find(|(args, _)| *args == self.args) {
                            return parser.clone();
                        }
                    }
                    (Rc::clone(build), memoize)
                }
            }
        };
        let grammar = Grammar {
            table: Rc::clone(&table),
        };
        let parser = build(&grammar, &self.args);
        if memoize {
            if let Some(Definition::Factory { memo, .. }) = table.borrow_mut().rules.get_mut(&self.name) {
                memo.push((self.args.clone(), parser.clone()));
            }
        }
        parser
    }

    fn belongs_to(&self, table: &Rc<RefCell<RuleTable<T>>>) -> bool {
        std::ptr::eq(self.table.as_ptr(), Rc::as_ptr(table))
    }

    pub(crate) fn same(&self, other: &RuleRef<T>) -> bool {
        Weak::ptr_eq(&self.table, &other.table) && self.name == other.name && self.args == other.args
    }
}

impl<T: Symbol> fmt::Display for RuleRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{kind, token};
    use crate::testing::{chars, tok};
    use std::cell::Cell;

    #[test]
    fn test_forward_and_recursive_references() {
        let g: Grammar<String> = Grammar::new();
        g.define(
            "list",
            (token("(") - g.rule("elems") - token(")")).map(|m| m[1].clone()),
        )
        .unwrap();
        g.define(
            "elems",
            (g.rule("list") | token("a") | token("b")).many().map(|m| {
                let items = m[0].as_list().unwrap_or_default();
                Value::list(items.iter().map(|item| item.as_list().unwrap()[0].clone()))
            }),
        )
        .unwrap();
        let result = g.parse("list", chars("(a(ab)b)")).unwrap();
        assert_eq!(
            result,
            Some(Value::list(vec![
                tok("a"),
                Value::list(vec![tok("a"), tok("b")]),
                tok("b"),
            ]))
        );
    }

    #[test]
    fn test_duplicate_definition() {
        let g: Grammar<String> = Grammar::new();
        g.define_token("a", "a").unwrap();
        assert!(matches!(g.define_token("a", "b"), Err(Error::DuplicateRule(name)) if name == "a"));
    }

    #[test]
    fn test_undefined_reference_is_reported_before_parsing() {
        let g: Grammar<String> = Grammar::new();
        g.define("start", token("a") - g.rule("missing")).unwrap();
        assert!(matches!(g.validate(), Err(Error::UndefinedRule(name)) if name == "missing"));
        assert!(g.parse("start", chars("ab")).is_err());
        assert!(matches!(g.parser("nope"), Err(Error::UndefinedRule(_))));
    }

    #[test]
    fn test_extend_appends_alternative() {
        let g: Grammar<String> = Grammar::new();
        g.define_token("letter", "a").unwrap();
        g.extend("letter", token("b")).unwrap();
        assert_eq!(g.parse("letter", chars("b")).unwrap(), Some(tok("b")));
        assert!(g.extend("digit", token("1")).is_err());
    }

    #[test]
    fn test_factory_arguments() {
        let g: Grammar<String> = Grammar::new();
        g.define_factory("twice", |_, args| {
            let text = args[0].text().unwrap_or_default().to_string();
            token(text.as_str()) - token(text.as_str())
        })
        .unwrap();
        g.define("start", g.rule_with("twice", vec![Value::Str("x".into())])).unwrap();
        assert_eq!(g.parse("start", chars("xx")).unwrap(), Some(tok("x")));
        assert_eq!(g.parse("start", chars("xy")).unwrap(), None);
    }

    #[test]
    fn test_memoized_factories_build_once() {
        let options = Options {
            memoize_rules: true,
            ..Options::default()
        };
        let g: Grammar<String> = Grammar::with_options(options);
        let built = Rc::new(Cell::new(0));
        let counter = Rc::clone(&built);
        g.define_factory("a", move |_, _| {
            counter.set(counter.get() + 1);
            token("a")
        })
        .unwrap();
        g.define("start", g.rule("a").many()).unwrap();
        g.parse("start", chars("aaa")).unwrap();
        assert_eq!(built.get(), 1);
    }

    #[test]
    fn test_factories_rebuild_without_memoization() {
        let g: Grammar<String> = Grammar::new();
        let built = Rc::new(Cell::new(0));
        let counter = Rc::clone(&built);
        g.define_factory("a", move |_, _| {
            counter.set(counter.get() + 1);
            token("a")
        })
        .unwrap();
        g.define("start", g.rule("a").many()).unwrap();
        g.parse("start", chars("aa")).unwrap();
        // two matches and the failed attempt at end of input
        assert_eq!(built.get(), 3);
    }

    #[test]
    fn test_rule_references_are_structural() {
        let g: Grammar<String> = Grammar::new();
        let other: Grammar<String> = Grammar::new();
        assert!(g.rule("x").same(&g.rule("x")));
        assert!(!g.rule("x").same(&g.rule("y")));
        assert!(!g.rule("x").same(&other.rule("x")));
        assert!(!g.rule_with("x", vec![Value::Int(1)]).same(&g.rule_with("x", vec![Value::Int(2)])));
    }

    #[test]
    #[should_panic(expected = "rule `a` evaluated after its grammar was dropped")]
    fn test_orphaned_reference_panics() {
        let p = {
            let g: Grammar<String> = Grammar::new();
            g.define_token("a", "a").unwrap();
            g.rule("a")
        };
        p.parse(chars("a"));
    }

    #[test]
    #[should_panic(expected = "undefined rule `missing`")]
    fn test_undefined_reference_panics_when_evaluated() {
        let g: Grammar<String> = Grammar::new();
        let p = token("a") - g.rule("missing");
        p.parse(chars("ab"));
    }

    #[test]
    fn test_unreachable_references_do_not_block_parsing() {
        let g: Grammar<String> = Grammar::new();
        g.define_token("start", "a").unwrap();
        let _unused = g.rule("unused") - g.rule("start");
        assert_eq!(g.parse("start", chars("a")).unwrap(), Some(tok("a")));
        g.define("other", g.rule("never")).unwrap();
        assert_eq!(g.parse("start", chars("a")).unwrap(), Some(tok("a")));
        assert!(matches!(g.parse("other", chars("a")), Err(Error::UndefinedRule(name)) if name == "never"));
        assert!(matches!(g.validate(), Err(Error::UndefinedRule(name)) if name == "never"));
    }

    #[test]
    fn test_references_into_other_grammars_are_not_followed() {
        let g: Grammar<String> = Grammar::new();
        let other: Grammar<String> = Grammar::new();
        other.define_token("x", "x").unwrap();
        g.define("start", other.rule("x")).unwrap();
        assert_eq!(g.parse("start", chars("x")).unwrap(), Some(tok("x")));
    }

    #[test]
    fn test_explicit_mode_keeps_plain_choice() {
        let options = Options {
            optimize: OptimizeMode::Explicit,
            ..Options::default()
        };
        let g: Grammar<String> = Grammar::with_options(options);
        let p = g.choice(kind("x") - token("a"), kind("x") - token("b"));
        insta::assert_snapshot!(p.to_string(), @"((:x a) | (:x b))");
        let eager: Grammar<String> = Grammar::new();
        let p = eager.choice(kind("x") - token("a"), kind("x") - token("b"));
        insta::assert_snapshot!(p.to_string(), @"((:x (a + b)) <action>)");
    }

    #[test]
    fn test_rule_display() {
        let g: Grammar<String> = Grammar::new();
        let p = g.rule("expr") - g.rule_with("term", vec![Value::Int(2)]);
        assert_eq!(p.to_string(), "(expr term(2))");
        assert_eq!(g.names(), Vec::<String>::new());
    }
}
