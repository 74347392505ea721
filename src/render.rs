use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use textwrap::{wrap, Options as WrapOptions};
use unicode_width::UnicodeWidthStr;

use crate::dummyjson::{CommentUser, User};
use crate::feed::{Author, Commenter, PostBlock, UNKNOWN_COMMENTER, UNKNOWN_POSTER};
use crate::popup::UserDetails;

pub const COLOR_BG: Color = Color::Rgb(30, 30, 46);
pub const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
pub const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
pub const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
pub const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
pub const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
pub const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
pub const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
pub const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
pub const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const AVATAR: &str = "◉";
const COMMENT_INDENT: &str = "  ";
const DEFAULT_WIDTH: usize = 80;

/// A clickable username in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLink {
    Canonical(User),
    Embedded(CommentUser),
}

impl UserLink {
    pub fn details(&self) -> UserDetails {
        match self {
            UserLink::Canonical(user) => UserDetails::from(user),
            UserLink::Embedded(reference) => UserDetails::from(reference),
        }
    }
}

/// Append-only rendering of every post block loaded so far. Blocks are kept
/// so the text can be re-wrapped when the pane width changes.
#[derive(Debug)]
pub struct Document {
    width: usize,
    blocks: Vec<PostBlock>,
    lines: Vec<Line<'static>>,
    line_links: Vec<Option<usize>>,
    links: Vec<(usize, UserLink)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

impl Document {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            blocks: Vec::new(),
            lines: Vec::new(),
            line_links: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn append(&mut self, blocks: Vec<PostBlock>) {
        for block in blocks {
            self.render_block(&block);
            self.blocks.push(block);
        }
    }

    /// Re-wraps everything for a new width. Returns whether anything changed.
    pub fn set_width(&mut self, width: usize) -> bool {
        let width = width.max(1);
        if width == self.width {
            return false;
        }
        self.width = width;
        self.lines.clear();
        self.line_links.clear();
        self.links.clear();
        let blocks = std::mem::take(&mut self.blocks);
        for block in &blocks {
            self.render_block(block);
        }
        self.blocks = blocks;
        true
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link(&self, index: usize) -> Option<&UserLink> {
        self.links.get(index).map(|(_, link)| link)
    }

    pub fn link_line(&self, index: usize) -> Option<usize> {
        self.links.get(index).map(|(line, _)| *line)
    }

    /// Index of the link whose username sits on `line`.
    pub fn link_at(&self, line: usize) -> Option<usize> {
        self.line_links.get(line).copied().flatten()
    }

    /// Plain text of each line, without styling.
    pub fn text_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    fn push(&mut self, line: Line<'static>, link: Option<usize>) {
        self.lines.push(line);
        self.line_links.push(link);
    }

    fn push_all(&mut self, lines: Vec<Line<'static>>) {
        for line in lines {
            self.push(line, None);
        }
    }

    /// Only the first line of a wrapped username activates the link.
    fn push_linked(&mut self, lines: Vec<Line<'static>>, link: UserLink) {
        let mut lines = lines.into_iter();
        let Some(first) = lines.next() else {
            return;
        };
        let link = self.add_link(link);
        self.push(first, Some(link));
        self.push_all(lines.collect());
    }

    fn add_link(&mut self, link: UserLink) -> usize {
        self.links.push((self.lines.len(), link));
        self.links.len() - 1
    }

    fn render_block(&mut self, block: &PostBlock) {
        let width = self.width;
        let title_style = Style::default()
            .fg(COLOR_TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD);
        let body_style = Style::default().fg(COLOR_TEXT_SECONDARY);
        let meta_style = Style::default().fg(COLOR_TEXT_SECONDARY);
        let link_style = Style::default()
            .fg(COLOR_ACCENT)
            .add_modifier(Modifier::UNDERLINED);
        let unknown_style = Style::default()
            .fg(COLOR_ERROR)
            .add_modifier(Modifier::ITALIC);

        self.push_all(wrap_plain(&block.post.title, width, title_style));
        self.push_all(wrap_plain(&block.post.body, width, body_style));
        self.push(
            Line::from(vec![
                Span::styled(
                    block.post.reactions.to_string(),
                    Style::default()
                        .fg(COLOR_SUCCESS)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" likes", meta_style),
            ]),
            None,
        );

        match &block.author {
            Author::Known(user) => {
                let prefix = format!("{AVATAR} ");
                let mut lines =
                    wrap_with_prefixes(&user.username, width, &prefix, "  ", link_style);
                if let Some(first) = lines.first_mut() {
                    *first = split_head(first, &prefix, &user.username, link_style, link_style);
                }
                self.push_linked(lines, UserLink::Canonical(user.clone()));
            }
            Author::Unknown => {
                self.push_all(wrap_plain(UNKNOWN_POSTER, width, unknown_style));
            }
        }

        if !block.comments.is_empty() {
            self.push(
                Line::from(Span::styled(
                    "Comments:",
                    Style::default()
                        .fg(COLOR_TEXT_PRIMARY)
                        .add_modifier(Modifier::BOLD),
                )),
                None,
            );
            for entry in &block.comments {
                let (name, head_prefix, style, link) = match &entry.commenter {
                    Commenter::Known(user) => (
                        user.username.as_str(),
                        format!("{COMMENT_INDENT}{AVATAR} "),
                        link_style,
                        UserLink::Canonical(user.clone()),
                    ),
                    Commenter::Unknown(reference) => (
                        UNKNOWN_COMMENTER,
                        COMMENT_INDENT.to_string(),
                        unknown_style,
                        UserLink::Embedded(reference.clone()),
                    ),
                };
                let text = format!("{name}: {}", entry.body);
                let rest_prefix = " ".repeat(head_prefix.chars().count() + 2);
                let mut lines = wrap_with_prefixes(&text, width, &head_prefix, &rest_prefix, body_style);
                if let Some(first) = lines.first_mut() {
                    *first = split_head(first, &head_prefix, name, style, body_style);
                }
                self.push_linked(lines, link);
            }
        }

        self.push_all(wrap_plain(&block.tags, width, meta_style));
        self.push(Line::default(), None);
    }
}

/// Restyles the first wrapped line of a comment so the username stands out.
fn split_head(
    line: &Line<'static>,
    prefix: &str,
    name: &str,
    name_style: Style,
    rest_style: Style,
) -> Line<'static> {
    let content: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
    let Some(after_prefix) = content.strip_prefix(prefix) else {
        return Line::from(Span::styled(content, name_style));
    };
    let Some(rest) = after_prefix.strip_prefix(name) else {
        return Line::from(Span::styled(content, name_style));
    };
    Line::from(vec![
        Span::styled(prefix.to_string(), Style::default().fg(COLOR_ACCENT)),
        Span::styled(name.to_string(), name_style),
        Span::styled(rest.to_string(), rest_style),
    ])
}

pub fn wrap_with_prefixes(
    text: &str,
    width: usize,
    first_prefix: &str,
    rest_prefix: &str,
    style: Style,
) -> Vec<Line<'static>> {
    if text.trim().is_empty() {
        return vec![Line::from(Span::styled(first_prefix.to_string(), style))];
    }

    let min_width = first_prefix
        .chars()
        .count()
        .max(rest_prefix.chars().count())
        .saturating_add(1);
    let wrap_width = width.max(min_width);
    let options = WrapOptions::new(wrap_width)
        .break_words(true)
        .initial_indent(first_prefix)
        .subsequent_indent(rest_prefix);

    wrap(text, options)
        .into_iter()
        .map(|cow| Line::from(Span::styled(cow.into_owned(), style)))
        .collect()
}

/// Wraps `text` to `width`. Single lines that already fit are kept verbatim,
/// trailing spaces included.
pub fn wrap_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    if !text.contains('\n') && UnicodeWidthStr::width(text) <= width {
        return vec![Line::from(Span::styled(text.to_string(), style))];
    }
    wrap_with_prefixes(text, width, "", "", style)
}

pub fn pad_lines_to_width(lines: &mut [Line<'static>], width: u16) {
    let width = width as usize;
    if width == 0 {
        return;
    }

    for line in lines {
        let current_width: usize = line
            .spans
            .iter()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum();
        if current_width >= width {
            continue;
        }
        let pad_style = line.spans.last().map(|span| span.style).unwrap_or_default();
        let padding = " ".repeat(width - current_width);
        line.spans.push(Span::styled(padding, pad_style));
    }
}
