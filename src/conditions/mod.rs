//! Condition framework: value providers, comparers and predicates.
//!
//! A [`Condition`] reads two values of the same type from
//! [`ValueProvider`]s and compares them with a [`Comparer`] picked by tag
//! from that type's [`ComparerRegistry`]. The framework is generic over the
//! value type; every type that implements [`ComparableValue`] is its own
//! family with its own strategy set:
//!
//! | Family | Type        | Strategies                        |
//! |--------|-------------|-----------------------------------|
//! | Bool   | `bool`      | equal, not-equal                  |
//! | Float  | `f32`       | equality and the four orderings   |
//! | Int    | `i64`       | equality and the four orderings   |
//! | Object | [`ObjectRef`] | equal, not-equal                |
//!
//! Predicates compose with [`AllOf`], [`AnyOf`] and [`Not`].

mod comparer;
mod condition;
mod provider;

pub use comparer::{
    tags, ComparableValue, Comparer, ComparerFactory, ComparerRegistry, Equal, Greater,
    GreaterOrEqual, Less, LessOrEqual, NotEqual, ObjectRef,
};
pub use condition::{
    AllOf, AnyOf, BoolCondition, Condition, FloatCondition, IntCondition, Not, ObjectCondition,
    Predicate, TypeSelector,
};
pub use provider::{Constant, FnProvider, SharedProvider, ValueProvider, Variable};
