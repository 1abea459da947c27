use euclid::default::{Point2D, Size2D};
use serde::Serialize;

use crate::client_mirror::ClientMirror;
use crate::types::{ConnectionId, CURSOR_SIZE};

/// One paint instruction in pixel space, in the order the shell should
/// execute them. Serialized as JSON for the canvas shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum DrawOp {
    Circle {
        center: Point2D<f32>,
        radius: f32,
        color: String,
    },
    Segment {
        from: Point2D<f32>,
        to: Point2D<f32>,
        width: f32,
        color: String,
    },
    Cursor {
        pos: Point2D<f32>,
        size: f32,
        label: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderFrame {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListEntry {
    pub id: ConnectionId,
    pub username: String,
    pub me: bool,
}

fn to_pixels(x: f32, y: f32, viewport: &Size2D<f32>) -> Point2D<f32> {
    Point2D::new(x * viewport.width / 100.0, y * viewport.height / 100.0)
}

/// Turns the mirror into a flat draw-op list for the current viewport.
/// Strokes first: a filled circle per drawable point, plus a segment of
/// double width connecting consecutive points of the same stroke; a
/// pen-lift point breaks the chain without being drawn. Cursor glyphs and
/// name labels last, at display positions, skipping the local user.
pub fn materialize_frame(
    mirror: &ClientMirror,
    viewport_width: f32,
    viewport_height: f32,
) -> RenderFrame {
    let viewport = Size2D::new(viewport_width, viewport_height);
    let mut ops = Vec::new();

    let mut ids: Vec<&ConnectionId> = mirror.points().keys().collect();
    ids.sort();
    for id in ids {
        let mut last: Option<Point2D<f32>> = None;
        for point in &mirror.points()[id] {
            let color = match point.color() {
                Some(color) => color,
                None => {
                    last = None;
                    continue;
                }
            };
            let center = to_pixels(point.x(), point.y(), &viewport);
            ops.push(DrawOp::Circle {
                center,
                radius: point.width(),
                color: color.to_owned(),
            });
            if let Some(from) = last {
                ops.push(DrawOp::Segment {
                    from,
                    to: center,
                    width: point.width() * 2.0,
                    color: color.to_owned(),
                });
            }
            last = Some(center);
        }
    }

    let mut entries: Vec<_> = mirror.users().values().collect();
    entries.sort_by_key(|entry| entry.user.id);
    for entry in entries {
        if Some(entry.user.id) == mirror.local_id() {
            continue;
        }
        ops.push(DrawOp::Cursor {
            pos: to_pixels(entry.display_x, entry.display_y, &viewport),
            size: CURSOR_SIZE,
            label: entry.user.username.clone(),
        });
    }

    RenderFrame { ops }
}

/// Roster for the sidebar, ordered by connection id.
pub fn materialize_user_list(mirror: &ClientMirror) -> Vec<UserListEntry> {
    let mut entries: Vec<_> = mirror
        .users()
        .values()
        .map(|entry| UserListEntry {
            id: entry.user.id,
            username: entry.user.username.clone(),
            me: Some(entry.user.id) == mirror.local_id(),
        })
        .collect();
    entries.sort_by_key(|entry| entry.id);
    entries
}
