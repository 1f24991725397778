// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Tree-style printers for reporting what a run is doing.
use std::{borrow::Cow, sync::Mutex};

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

lazy_static::lazy_static! {
    static ref WARNINGS: Mutex<Vec<Vec<Cow<'static, str>>>> = Mutex::new(vec![]);
}

/// The symbol drawn before a line, given where it sits in its block and where
/// its block sits in the tree.
fn branch(i_line: usize, last_line: bool, last_block: bool) -> char {
    match (i_line, last_line, last_block) {
        (0, false, _) | (0, _, false) => VERTICAL_AND_RIGHT,
        (0, true, true) => UP_AND_RIGHT,
        _ => VERTICAL,
    }
}

fn tree_lines(blocks: &[Vec<Cow<'static, str>>]) -> Vec<String> {
    let num_blocks = blocks.len();
    blocks
        .iter()
        .enumerate()
        .flat_map(|(i_block, block)| {
            let num_lines = block.len();
            block.iter().enumerate().map(move |(i_line, line)| {
                let symbol = branch(i_line, i_line + 1 == num_lines, i_block + 1 == num_blocks);
                format!("{symbol} {line}")
            })
        })
        .collect()
}

pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Vec<Cow<'static, str>>>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Vec<Cow<'static, str>>) {
        self.blocks.push(block);
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        tree_lines(&self.blocks)
    }

    pub(crate) fn display(self) {
        log::info!("{}", console::style(&self.title).bold());
        for line in self.lines() {
            log::info!("{line}");
        }
        log::info!("");
    }
}

pub(crate) trait Warn {
    fn warn(self);
}

fn push_warning(block: Vec<Cow<'static, str>>) {
    WARNINGS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(block);
}

impl Warn for &'static str {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for String {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        push_warning(self);
    }
}

/// Print out any warnings collected while arguments were being parsed.
pub(crate) fn display_warnings() {
    let mut warnings = WARNINGS.lock().unwrap_or_else(|e| e.into_inner());
    log::debug!("Displaying warnings");
    if warnings.is_empty() {
        return;
    }

    log::warn!("{}", console::style("Warnings").bold());
    for line in tree_lines(&warnings) {
        log::warn!("{line}");
    }
    log::warn!("");
    warnings.clear();
}
