//! Build-time evaluation of `process.env.NODE_ENV` guards.
//!
//! An `if` whose test compares a string literal with `process.env.NODE_ENV`
//! using `==`, `===`, `!=` or `!==` is decided against the configured
//! environment and collapsed to the branch that would run. The branch that
//! cannot run is dropped before anything inside it is visited, so `require`
//! calls it contains are never resolved. Every other shape is left alone.

use log::debug;
use oxc_ast::ast::{BinaryOperator, Expression, IfStatement, Statement};

/// What pruning did to a statement
#[derive(Debug)]
pub enum Pruned<'a> {
    /// Not an environment guard; the statement is handed back as-is
    Unchanged(Statement<'a>),
    /// The guard was decided and this branch takes its place
    Replaced(Statement<'a>),
    /// The guard was false and had no `else`
    Removed,
}

/// Decide a single statement against `env`
pub fn prune_statement<'a>(stmt: Statement<'a>, env: &str) -> Pruned<'a> {
    let if_stmt = match stmt {
        Statement::IfStatement(if_stmt) => if_stmt,
        other => return Pruned::Unchanged(other),
    };
    let Some(result) = evaluate_condition(&if_stmt.test, env) else {
        return Pruned::Unchanged(Statement::IfStatement(if_stmt));
    };

    let IfStatement {
        consequent,
        alternate,
        ..
    } = if_stmt.unbox();

    match (result, alternate) {
        (true, alternate) => {
            debug!(
                "NODE_ENV guard is true for '{env}', keeping consequent{}",
                if alternate.is_some() { " and dropping else branch" } else { "" }
            );
            Pruned::Replaced(consequent)
        }
        (false, Some(alternate)) => {
            debug!("NODE_ENV guard is false for '{env}', keeping else branch");
            Pruned::Replaced(alternate)
        }
        (false, None) => {
            debug!("NODE_ENV guard is false for '{env}', removing statement");
            Pruned::Removed
        }
    }
}

/// Prune repeatedly until the statement is no longer a decidable guard
///
/// A kept branch may itself be a guard (`else if (process.env.NODE_ENV ...)`).
/// Returns `None` when the statement disappears entirely.
pub fn settle<'a>(mut stmt: Statement<'a>, env: &str) -> Option<Statement<'a>> {
    loop {
        match prune_statement(stmt, env) {
            Pruned::Unchanged(kept) => return Some(kept),
            Pruned::Replaced(branch) => stmt = branch,
            Pruned::Removed => return None,
        }
    }
}

/// Evaluate `<literal> <op> process.env.NODE_ENV` (either operand order)
///
/// Returns `None` for any test that is not exactly that shape.
pub fn evaluate_condition(test: &Expression<'_>, env: &str) -> Option<bool> {
    let Expression::BinaryExpression(binary) = test.without_parentheses() else {
        return None;
    };
    let negated = match binary.operator {
        BinaryOperator::Equality | BinaryOperator::StrictEquality => false,
        BinaryOperator::Inequality | BinaryOperator::StrictInequality => true,
        _ => return None,
    };

    let left = binary.left.without_parentheses();
    let right = binary.right.without_parentheses();
    let literal = if is_node_env_access(left) {
        string_value(right)?
    } else if is_node_env_access(right) {
        string_value(left)?
    } else {
        return None;
    };

    Some((literal == env) != negated)
}

/// `process.env.NODE_ENV` written with static member access
fn is_node_env_access(expr: &Expression<'_>) -> bool {
    let Expression::StaticMemberExpression(outer) = expr else {
        return false;
    };
    if outer.property.name.as_str() != "NODE_ENV" {
        return false;
    }
    let Expression::StaticMemberExpression(inner) = outer.object.without_parentheses() else {
        return false;
    };
    inner.property.name.as_str() == "env"
        && matches!(&inner.object, Expression::Identifier(ident) if ident.name.as_str() == "process")
}

/// String literals and substitution-free template literals
fn string_value<'e>(expr: &'e Expression<'_>) -> Option<&'e str> {
    match expr {
        Expression::StringLiteral(literal) => Some(literal.value.as_str()),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => template
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| cooked.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use oxc_allocator::Allocator;
    use oxc_codegen::Codegen;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    use super::*;

    /// Settle the single statement in `source` and print what remains
    fn settle_source(source: &str, env: &str) -> Option<String> {
        let allocator = Allocator::default();
        let mut program = Parser::new(&allocator, source, SourceType::cjs())
            .parse()
            .program;
        let stmt = program.body.pop().expect("one statement");
        let kept = settle(stmt, env)?;
        program.body.push(kept);
        Some(Codegen::new().build(&program).code)
    }

    fn condition(source: &str, env: &str) -> Option<bool> {
        let allocator = Allocator::default();
        let program = Parser::new(&allocator, source, SourceType::cjs())
            .parse()
            .program;
        match program.body.first() {
            Some(Statement::IfStatement(if_stmt)) => evaluate_condition(&if_stmt.test, env),
            _ => panic!("expected an if statement"),
        }
    }

    #[test]
    fn test_operators_and_operand_order() {
        let env = "production";
        assert_eq!(
            condition("if (process.env.NODE_ENV === 'production') {}", env),
            Some(true)
        );
        assert_eq!(
            condition("if ('production' == process.env.NODE_ENV) {}", env),
            Some(true)
        );
        assert_eq!(
            condition("if (process.env.NODE_ENV !== 'production') {}", env),
            Some(false)
        );
        assert_eq!(
            condition("if ('development' != process.env.NODE_ENV) {}", env),
            Some(true)
        );
        assert_eq!(
            condition("if ((process.env.NODE_ENV) === `production`) {}", env),
            Some(true)
        );
    }

    #[test]
    fn test_unrecognized_shapes_are_skipped() {
        let env = "production";
        assert_eq!(condition("if (process.env.NODE_ENV) {}", env), None);
        assert_eq!(
            condition("if (process.env.NODE_ENV < 'production') {}", env),
            None
        );
        assert_eq!(
            condition("if (process.env.DEBUG === 'production') {}", env),
            None
        );
        assert_eq!(
            condition("if (proc.env.NODE_ENV === 'production') {}", env),
            None
        );
        assert_eq!(
            condition("if (process.env['NODE_ENV'] === 'production') {}", env),
            None
        );
        assert_eq!(
            condition("if (process.env.NODE_ENV === mode) {}", env),
            None
        );
    }

    #[test]
    fn test_true_keeps_consequent_and_drops_alternate() {
        let code = settle_source(
            "if (process.env.NODE_ENV === 'development') { devTools(); } else { prodTools(); }",
            "development",
        )
        .expect("consequent kept");
        assert!(code.contains("devTools()"));
        assert!(!code.contains("prodTools"));
        assert!(!code.contains("NODE_ENV"));
    }

    #[test]
    fn test_false_takes_alternate() {
        let code = settle_source(
            "if (process.env.NODE_ENV === 'development') { devTools(); } else { prodTools(); }",
            "production",
        )
        .expect("alternate kept");
        assert!(code.contains("prodTools()"));
        assert!(!code.contains("devTools"));
    }

    #[test]
    fn test_false_without_alternate_is_removed() {
        assert_eq!(
            settle_source(
                "if (process.env.NODE_ENV === 'development') { require('./devOnly'); }",
                "production",
            ),
            None
        );
    }

    #[test]
    fn test_else_if_chain_settles() {
        let source = "if (process.env.NODE_ENV === 'development') { a(); } \
                      else if (process.env.NODE_ENV === 'test') { b(); } \
                      else { c(); }";
        let code = settle_source(source, "test").expect("b kept");
        assert!(code.contains("b()"));
        assert!(!code.contains("a()"));
        assert!(!code.contains("c()"));

        let code = settle_source(source, "production").expect("c kept");
        assert!(code.contains("c()"));
        assert!(!code.contains("NODE_ENV"));
    }

    #[test]
    fn test_ordinary_if_is_untouched() {
        let code = settle_source("if (ready) { go(); } else { wait(); }", "production")
            .expect("kept");
        assert!(code.contains("ready"));
        assert!(code.contains("wait()"));
    }
}
