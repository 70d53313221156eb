//! DagMap - named vertices ordered by `before`/`after` constraints
//!
//! Each vertex keeps the list of its incoming prerequisites (vertices that must
//! come earlier) and a flag telling whether anything depends on it. Adding an
//! edge first checks reachability so a cycle is rejected at insertion time and
//! the graph always stays acyclic.

use crate::{Error, Result};
use std::collections::HashMap;

/// A vertex in the emitted order. `value` is `None` for vertices that were
/// only ever named by a constraint and never added with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedVertex<T> {
    pub name: String,
    pub value: Option<T>,
}

#[derive(Debug, Clone)]
struct Vertex<T> {
    name: String,
    /// Prerequisites, in insertion order
    incoming: Vec<usize>,
    has_outgoing: bool,
    value: Option<T>,
}

/// 순서 제약 그래프
#[derive(Debug, Clone)]
pub struct DagMap<T> {
    vertices: Vec<Vertex<T>>,
    index: HashMap<String, usize>,
}

impl<T> DagMap<T> {
    /// 새 그래프 생성
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add (or update) a vertex and its ordering constraints.
    ///
    /// `before` names vertices this one must precede; `after` names vertices it
    /// must follow. Unknown names are created as payload-less vertices.
    pub fn add<S: AsRef<str>>(
        &mut self,
        name: &str,
        value: Option<T>,
        before: &[S],
        after: &[S],
    ) -> Result<()> {
        let v = self.vertex(name);
        if value.is_some() {
            self.vertices[v].value = value;
        }

        for target in before {
            self.add_edge(name, target.as_ref())?;
        }
        for source in after {
            self.add_edge(source.as_ref(), name)?;
        }

        Ok(())
    }

    /// Require `from` to be ordered before `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        let v = self.vertex(from);
        let w = self.vertex(to);

        if v == w {
            return Err(Error::CycleDetected {
                path: vec![to.to_string(), to.to_string()],
            });
        }

        if self.vertices[w].incoming.contains(&v) {
            return Ok(());
        }

        // `to` already precedes `from` → the new edge closes a loop
        if let Some(chain) = self.prerequisite_path(v, w) {
            let mut path = Vec::with_capacity(chain.len() + 1);
            path.push(self.vertices[w].name.clone());
            path.extend(chain.into_iter().map(|i| self.vertices[i].name.clone()));
            return Err(Error::CycleDetected { path });
        }

        self.vertices[w].incoming.push(v);
        self.vertices[v].has_outgoing = true;
        Ok(())
    }

    /// Vertex count (including payload-less placeholders)
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index
            .get(name)
            .and_then(|&i| self.vertices[i].value.as_ref())
    }

    /// Ordered view of every vertex.
    pub fn sorted(&self) -> Vec<SortedVertex<&T>> {
        self.order()
            .into_iter()
            .map(|i| SortedVertex {
                name: self.vertices[i].name.clone(),
                value: self.vertices[i].value.as_ref(),
            })
            .collect()
    }

    /// Consume the graph, yielding every vertex in order.
    pub fn into_sorted(self) -> Vec<SortedVertex<T>> {
        let order = self.order();
        let mut slots: Vec<Option<Vertex<T>>> = self.vertices.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .map(|vertex| SortedVertex {
                name: vertex.name,
                value: vertex.value,
            })
            .collect()
    }

    /// Payloads only, in order.
    pub fn into_sorted_values(self) -> Vec<T> {
        self.into_sorted()
            .into_iter()
            .filter_map(|vertex| vertex.value)
            .collect()
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn vertex(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.vertices.len();
        self.vertices.push(Vertex {
            name: name.to_string(),
            incoming: Vec::new(),
            has_outgoing: false,
            value: None,
        });
        self.index.insert(name.to_string(), i);
        i
    }

    /// Walk prerequisites from `start` looking for `target`. Returns the chain
    /// `start, ..., target` when found.
    fn prerequisite_path(&self, start: usize, target: usize) -> Option<Vec<usize>> {
        let mut visited = vec![false; self.vertices.len()];
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        visited[start] = true;

        while let Some(top) = stack.last_mut() {
            let (v, pos) = *top;
            if v == target {
                return Some(stack.iter().map(|(i, _)| *i).collect());
            }
            match self.vertices[v].incoming.get(pos) {
                Some(&next) => {
                    top.1 += 1;
                    if !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }

        None
    }

    /// Depth-first from every vertex nothing depends on, emitting each vertex
    /// after all of its prerequisites.
    fn order(&self) -> Vec<usize> {
        let mut visited = vec![false; self.vertices.len()];
        let mut out = Vec::with_capacity(self.vertices.len());

        for start in 0..self.vertices.len() {
            if !self.vertices[start].has_outgoing {
                self.visit(start, &mut visited, &mut out);
            }
        }
        // every vertex of an acyclic graph reaches a sink, so this is a no-op
        // unless the invariant was broken
        for start in 0..self.vertices.len() {
            self.visit(start, &mut visited, &mut out);
        }

        out
    }

    fn visit(&self, start: usize, visited: &mut [bool], out: &mut Vec<usize>) {
        if visited[start] {
            return;
        }
        visited[start] = true;

        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let (v, pos) = *top;
            match self.vertices[v].incoming.get(pos) {
                Some(&next) => {
                    top.1 += 1;
                    if !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                }
                None => {
                    out.push(v);
                    stack.pop();
                }
            }
        }
    }
}

impl<T> Default for DagMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
