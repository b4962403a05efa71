//! Small pattern trees compiled through the regex_optimizer construct
//! compilers

use regex_bytecode::{
    BoundaryKind, ByteCode, ByteCodeResult, CompareTypeAndValuePair, LookAroundType,
};
use regex_optimizer::Optimizer;

/// A pattern node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(String),
    Class(Vec<CompareTypeAndValuePair>),
    Sequence(Vec<Node>),
    Alternation(Vec<Node>),
    Star { body: Box<Node>, greedy: bool },
    Plus { body: Box<Node>, greedy: bool },
    Optional { body: Box<Node>, greedy: bool },
    Counted {
        body: Box<Node>,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    },
    /// Capture group; ids are assigned left to right starting at 1
    Group(Box<Node>),
    LookAhead(Box<Node>),
    LookBehind { body: Box<Node>, length: usize },
    BackReference(usize),
    Begin,
    End,
    Boundary(BoundaryKind),
}

pub fn literal(text: &str) -> Node {
    Node::Literal(text.to_string())
}

pub fn star(body: Node) -> Node {
    Node::Star {
        body: Box::new(body),
        greedy: true,
    }
}

pub fn plus(body: Node) -> Node {
    Node::Plus {
        body: Box::new(body),
        greedy: true,
    }
}

pub fn seq(nodes: Vec<Node>) -> Node {
    Node::Sequence(nodes)
}

pub fn alt(nodes: Vec<Node>) -> Node {
    Node::Alternation(nodes)
}

pub fn group(body: Node) -> Node {
    Node::Group(Box::new(body))
}

/// Id counters shared across one compilation
#[derive(Debug, Default)]
struct Ids {
    groups: usize,
    repetitions: usize,
}

impl Node {
    /// Compile with the construct compilers configured on `optimizer`
    pub fn compile(&self, optimizer: &Optimizer) -> ByteCodeResult<ByteCode> {
        let mut ids = Ids::default();
        self.compile_into(optimizer, &mut ids)
    }

    fn compile_into(&self, optimizer: &Optimizer, ids: &mut Ids) -> ByteCodeResult<ByteCode> {
        let mut bytecode = ByteCode::new();
        match self {
            Node::Literal(text) => {
                for c in text.chars() {
                    bytecode.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::Char(
                        u32::from(c),
                    )]);
                }
            }
            Node::Class(pairs) => optimizer.append_character_class(&mut bytecode, pairs.clone()),
            Node::Sequence(nodes) => {
                for node in nodes {
                    bytecode.extend(node.compile_into(optimizer, ids)?);
                }
            }
            Node::Alternation(nodes) => {
                let alternatives = nodes
                    .iter()
                    .map(|node| node.compile_into(optimizer, ids))
                    .collect::<ByteCodeResult<Vec<_>>>()?;
                optimizer.append_alternation(&mut bytecode, alternatives)?;
            }
            Node::Star { body, greedy } => {
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_repetition_any(body, *greedy);
            }
            Node::Plus { body, greedy } => {
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_repetition_min_one(body, *greedy);
            }
            Node::Optional { body, greedy } => {
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_repetition_zero_or_one(body, *greedy);
            }
            Node::Counted {
                body,
                min,
                max,
                greedy,
            } => {
                let repetition_id = ids.repetitions;
                ids.repetitions += 1;
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_repetition_min_max(body, *min, *max, repetition_id, *greedy);
            }
            Node::Group(body) => {
                ids.groups += 1;
                let id = ids.groups;
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_group_capture(id, body);
            }
            Node::LookAhead(body) => {
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_lookaround(body, LookAroundType::LookAhead);
            }
            Node::LookBehind { body, length } => {
                let body = body.compile_into(optimizer, ids)?;
                bytecode.insert_bytecode_lookaround(
                    body,
                    LookAroundType::LookBehind { length: *length },
                );
            }
            Node::BackReference(id) => {
                bytecode.insert_bytecode_compare_values(vec![CompareTypeAndValuePair::Reference(*id)])
            }
            Node::Begin => bytecode.insert_bytecode_check_begin(),
            Node::End => bytecode.insert_bytecode_check_end(),
            Node::Boundary(kind) => bytecode.insert_bytecode_check_boundary(*kind),
        }
        Ok(bytecode)
    }
}
