//! Source-order traversal of Python syntax trees.
//!
//! Implementors override `visit_stmt`/`visit_expr` and call `walk_stmt` /
//! `walk_expr` to continue into children. Children are visited in the
//! order they appear in the source text.

use rustpython_parser::ast::{self, Expr, Stmt};

pub trait SourceVisitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_body<V: SourceVisitor + ?Sized>(visitor: &mut V, body: &[Stmt]) {
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: SourceVisitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::FunctionDef(ast::StmtFunctionDef {
            decorator_list,
            body,
            ..
        })
        | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef {
            decorator_list,
            body,
            ..
        }) => {
            walk_exprs(visitor, decorator_list);
            walk_body(visitor, body);
        }
        Stmt::ClassDef(ast::StmtClassDef {
            decorator_list,
            bases,
            keywords,
            body,
            ..
        }) => {
            walk_exprs(visitor, decorator_list);
            walk_exprs(visitor, bases);
            for keyword in keywords {
                visitor.visit_expr(&keyword.value);
            }
            walk_body(visitor, body);
        }
        Stmt::Return(ast::StmtReturn { value, .. }) => walk_opt(visitor, value),
        Stmt::Delete(ast::StmtDelete { targets, .. }) => walk_exprs(visitor, targets),
        Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
            walk_exprs(visitor, targets);
            visitor.visit_expr(value);
        }
        Stmt::AugAssign(ast::StmtAugAssign { target, value, .. }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Stmt::AnnAssign(ast::StmtAnnAssign {
            target,
            annotation,
            value,
            ..
        }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(annotation);
            walk_opt(visitor, value);
        }
        Stmt::For(ast::StmtFor {
            target,
            iter,
            body,
            orelse,
            ..
        })
        | Stmt::AsyncFor(ast::StmtAsyncFor {
            target,
            iter,
            body,
            orelse,
            ..
        }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(iter);
            walk_body(visitor, body);
            walk_body(visitor, orelse);
        }
        Stmt::While(ast::StmtWhile {
            test, body, orelse, ..
        })
        | Stmt::If(ast::StmtIf {
            test, body, orelse, ..
        }) => {
            visitor.visit_expr(test);
            walk_body(visitor, body);
            walk_body(visitor, orelse);
        }
        Stmt::With(ast::StmtWith { items, body, .. })
        | Stmt::AsyncWith(ast::StmtAsyncWith { items, body, .. }) => {
            for item in items {
                visitor.visit_expr(&item.context_expr);
                walk_opt(visitor, &item.optional_vars);
            }
            walk_body(visitor, body);
        }
        Stmt::Match(ast::StmtMatch { subject, cases, .. }) => {
            visitor.visit_expr(subject);
            for case in cases {
                walk_opt(visitor, &case.guard);
                walk_body(visitor, &case.body);
            }
        }
        Stmt::Raise(ast::StmtRaise { exc, cause, .. }) => {
            walk_opt(visitor, exc);
            walk_opt(visitor, cause);
        }
        Stmt::Try(ast::StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        })
        | Stmt::TryStar(ast::StmtTryStar {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        }) => {
            walk_body(visitor, body);
            for handler in handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                walk_opt(visitor, &handler.type_);
                walk_body(visitor, &handler.body);
            }
            walk_body(visitor, orelse);
            walk_body(visitor, finalbody);
        }
        Stmt::Assert(ast::StmtAssert { test, msg, .. }) => {
            visitor.visit_expr(test);
            walk_opt(visitor, msg);
        }
        Stmt::Expr(ast::StmtExpr { value, .. }) => visitor.visit_expr(value),
        _ => {}
    }
}

pub fn walk_expr<V: SourceVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::BoolOp(ast::ExprBoolOp { values, .. }) => walk_exprs(visitor, values),
        Expr::NamedExpr(ast::ExprNamedExpr { target, value, .. }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => visitor.visit_expr(operand),
        Expr::Lambda(ast::ExprLambda { body, .. }) => visitor.visit_expr(body),
        Expr::IfExp(ast::ExprIfExp {
            test, body, orelse, ..
        }) => {
            visitor.visit_expr(test);
            visitor.visit_expr(body);
            visitor.visit_expr(orelse);
        }
        Expr::Dict(ast::ExprDict { keys, values, .. }) => {
            for (key, value) in keys.iter().zip(values) {
                if let Some(key) = key {
                    visitor.visit_expr(key);
                }
                visitor.visit_expr(value);
            }
        }
        Expr::Set(ast::ExprSet { elts, .. })
        | Expr::List(ast::ExprList { elts, .. })
        | Expr::Tuple(ast::ExprTuple { elts, .. }) => walk_exprs(visitor, elts),
        Expr::ListComp(ast::ExprListComp {
            elt, generators, ..
        })
        | Expr::SetComp(ast::ExprSetComp {
            elt, generators, ..
        })
        | Expr::GeneratorExp(ast::ExprGeneratorExp {
            elt, generators, ..
        }) => {
            walk_generators(visitor, generators);
            visitor.visit_expr(elt);
        }
        Expr::DictComp(ast::ExprDictComp {
            key,
            value,
            generators,
            ..
        }) => {
            walk_generators(visitor, generators);
            visitor.visit_expr(key);
            visitor.visit_expr(value);
        }
        Expr::Await(ast::ExprAwait { value, .. })
        | Expr::YieldFrom(ast::ExprYieldFrom { value, .. })
        | Expr::Starred(ast::ExprStarred { value, .. })
        | Expr::Attribute(ast::ExprAttribute { value, .. }) => visitor.visit_expr(value),
        Expr::Yield(ast::ExprYield { value, .. }) => walk_opt(visitor, value),
        Expr::Compare(ast::ExprCompare {
            left, comparators, ..
        }) => {
            visitor.visit_expr(left);
            walk_exprs(visitor, comparators);
        }
        Expr::Call(ast::ExprCall {
            func,
            args,
            keywords,
            ..
        }) => {
            visitor.visit_expr(func);
            walk_exprs(visitor, args);
            for keyword in keywords {
                visitor.visit_expr(&keyword.value);
            }
        }
        Expr::FormattedValue(ast::ExprFormattedValue {
            value, format_spec, ..
        }) => {
            visitor.visit_expr(value);
            walk_opt(visitor, format_spec);
        }
        Expr::JoinedStr(ast::ExprJoinedStr { values, .. }) => walk_exprs(visitor, values),
        Expr::Subscript(ast::ExprSubscript { value, slice, .. }) => {
            visitor.visit_expr(value);
            visitor.visit_expr(slice);
        }
        Expr::Slice(ast::ExprSlice {
            lower, upper, step, ..
        }) => {
            walk_opt(visitor, lower);
            walk_opt(visitor, upper);
            walk_opt(visitor, step);
        }
        _ => {}
    }
}

fn walk_exprs<V: SourceVisitor + ?Sized>(visitor: &mut V, exprs: &[Expr]) {
    for expr in exprs {
        visitor.visit_expr(expr);
    }
}

fn walk_opt<V: SourceVisitor + ?Sized>(visitor: &mut V, expr: &Option<Box<Expr>>) {
    if let Some(expr) = expr {
        visitor.visit_expr(expr);
    }
}

fn walk_generators<V: SourceVisitor + ?Sized>(visitor: &mut V, generators: &[ast::Comprehension]) {
    for generator in generators {
        visitor.visit_expr(&generator.iter);
        visitor.visit_expr(&generator.target);
        walk_exprs(visitor, &generator.ifs);
    }
}
