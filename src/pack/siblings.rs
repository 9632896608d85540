use super::Circle;
use super::enclose::{Lcg, enclose};

/// Places `circles` (radii already set) tangentially around each other using a
/// front chain, then re-centres them so their enclosing circle sits on the
/// origin. Returns the enclosing radius.
pub(super) fn pack_siblings(circles: &mut [Circle], random: &mut Lcg) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    let (first, second) = (circles[0], circles[1]);
    place(second, first, &mut circles[2]);

    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    next[0] = 1;
    prev[2] = 1;
    next[1] = 2;
    prev[0] = 2;
    next[2] = 0;
    prev[1] = 0;

    let mut a = 0usize;
    let mut b = 1usize;
    let mut i = 3usize;

    'pack: while i < n {
        let (ca, cb) = (circles[a], circles[b]);
        place(ca, cb, &mut circles[i]);
        let c = i;

        // Closest intersecting circle along the chain, searching both ways.
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        let mut best = score(circles, a, next[a]);
        let mut cursor = c;
        loop {
            cursor = next[cursor];
            if cursor == b {
                break;
            }
            let candidate = score(circles, cursor, next[cursor]);
            if candidate < best {
                a = cursor;
                best = candidate;
            }
        }
        b = next[a];
        i += 1;
    }

    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }
    let enclosing = enclose(&chain, random);

    for circle in circles.iter_mut() {
        circle.x -= enclosing.x;
        circle.y -= enclosing.y;
    }

    enclosing.r
}

fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;

    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of a chain pair.
fn score(circles: &[Circle], a: usize, b: usize) -> f64 {
    let (a, b) = (circles[a], circles[b]);
    let ab = a.r + b.r;
    if ab <= 0.0 {
        return a.x * a.x + a.y * a.y;
    }
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}
