//! Expression evaluation.

use prefix_ir::{Expr, ExprKind};
use prefix_stack::ensure_sufficient_stack;

use super::{map_key, Interpreter};
use crate::errors::{undefined_identifier, uninitialized, EvalError, EvalResult};
use crate::value::{MapData, Selector, Tensor, TensorError, Value};

impl Interpreter {
    /// Evaluate an expression in the current scope.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr).map_err(|e| e.at(expr.loc)))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Flt(x) => Ok(Value::Float(*x)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            // A pointer literal outside an alias assignment reads its target.
            ExprKind::Ident(name) | ExprKind::Ptr(name) => self.read_identifier(name),
            ExprKind::Call {
                callee,
                args,
                kwargs,
            } => self.eval_call(callee, args, kwargs, expr.loc),
            ExprKind::Tns(items) => self.eval_tensor_literal(items),
            ExprKind::Map(pairs) => {
                let mut map = MapData::new();
                for (k, v) in pairs {
                    let key = map_key(&self.eval_expr(k)?)?;
                    let value = self.eval_expr(v)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            ExprKind::Index { target, indices } => {
                let base = self.eval_expr(target)?;
                self.eval_index(base, indices)
            }
            ExprKind::Range { .. } | ExprKind::Wildcard => {
                Err(EvalError::new("Slice or '*' is only valid inside an index"))
            }
        }
    }

    /// Owned copy of a binding's value.
    pub fn read_identifier(&self, name: &str) -> EvalResult {
        let binding = self
            .ns
            .get(&self.scope, name)
            .ok_or_else(|| undefined_identifier(name))?;
        if !binding.initialized {
            return Err(uninitialized(name));
        }
        Ok(binding.value)
    }

    /// `[a, b, ...]`: scalars form a vector; sub-tensors of one shape stack
    /// into a tensor of one more dimension.
    fn eval_tensor_literal(&mut self, items: &[Expr]) -> EvalResult {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval_expr(item)?);
        }
        let nested = values.iter().filter(|v| matches!(v, Value::Tensor(_))).count();
        if nested == 0 {
            return Ok(Value::tensor(Tensor::vector(values)));
        }
        if nested != values.len() {
            return Err(TensorError::Ragged.into());
        }
        let parts: Vec<Tensor> = values
            .iter()
            .filter_map(|v| match v {
                Value::Tensor(t) => Some(t.read().clone()),
                _ => None,
            })
            .collect();
        Ok(Value::tensor(Tensor::stack(&parts)?))
    }

    fn eval_index(&mut self, base: Value, indices: &[Expr]) -> EvalResult {
        match base {
            Value::Tensor(t) => {
                let selectors = self.eval_selectors(indices)?;
                let selected = t.read().select(&selectors)?;
                Ok(selected)
            }
            Value::Map(m) => {
                let mut current = Value::Map(m);
                for index in indices {
                    let key = map_key(&self.eval_expr(index)?)?;
                    let Value::Map(map) = &current else {
                        return Err(EvalError::new(format!(
                            "Cannot index {} with a map key",
                            current.type_name()
                        )));
                    };
                    let next = map.read().get(&key).cloned();
                    current = next.ok_or_else(|| {
                        EvalError::new(format!("Key {} not found", key.to_value()))
                    })?;
                }
                Ok(current)
            }
            other => Err(EvalError::new(format!("Cannot index {}", other.type_name()))),
        }
    }

    fn eval_selectors(&mut self, indices: &[Expr]) -> Result<Vec<Selector>, EvalError> {
        let mut selectors = Vec::with_capacity(indices.len());
        for index in indices {
            let sel = match &index.kind {
                ExprKind::Wildcard => Selector::All,
                ExprKind::Range { start, end } => {
                    let start = match start {
                        Some(e) => Some(self.eval_index_int(e)?),
                        None => None,
                    };
                    let end = match end {
                        Some(e) => Some(self.eval_index_int(e)?),
                        None => None,
                    };
                    Selector::Range(start, end)
                }
                _ => Selector::Index(self.eval_index_int(index)?),
            };
            selectors.push(sel);
        }
        Ok(selectors)
    }

    fn eval_index_int(&mut self, expr: &Expr) -> Result<i64, EvalError> {
        match self.eval_expr(expr)? {
            Value::Int(n) => Ok(n),
            other => Err(EvalError::new(format!(
                "Tensor index must be INT, got {}",
                other.type_name()
            ))
            .at(expr.loc)),
        }
    }

    /// Full element index for assignment: one INT per dimension.
    pub(crate) fn eval_int_indices(&mut self, indices: &[Expr]) -> Result<Vec<i64>, EvalError> {
        let mut out = Vec::with_capacity(indices.len());
        for index in indices {
            out.push(self.eval_index_int(index)?);
        }
        Ok(out)
    }
}
