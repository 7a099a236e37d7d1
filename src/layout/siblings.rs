use super::enclose::enclose;
use super::{Circle, Lcg};

/// Places `c` tangent to both `a` and `b`, on the left of the a→b direction.
fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r) * (a.r + c.r);
        let b2 = (b.r + c.r) * (b.r + c.r);
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

fn intersects(a: &Circle, b: &Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Circular doubly linked list over circle indices; links are never freed.
struct FrontChain {
    circle: Vec<usize>,
    next: Vec<usize>,
    prev: Vec<usize>,
}

impl FrontChain {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            circle: Vec::with_capacity(capacity),
            next: Vec::with_capacity(capacity),
            prev: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, circle: usize) -> usize {
        let link = self.circle.len();
        self.circle.push(circle);
        self.next.push(link);
        self.prev.push(link);
        link
    }

    fn link(&mut self, from: usize, to: usize) {
        self.next[from] = to;
        self.prev[to] = from;
    }

    /// Squared distance from the origin to the weighted midpoint of a link and its successor.
    fn score(&self, circles: &[Circle], link: usize) -> f64 {
        let a = circles[self.circle[link]];
        let b = circles[self.circle[self.next[link]]];
        let ab = a.r + b.r;
        let (dx, dy) = if ab > 0.0 {
            ((a.x * b.r + b.x * a.r) / ab, (a.y * b.r + b.y * a.r) / ab)
        } else {
            ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
        };
        dx * dx + dy * dy
    }
}

/// Packs `circles` (radii given, positions overwritten) around the origin
/// without overlap and returns the radius of their enclosing circle, which is
/// centered on the origin afterwards.
pub(super) fn pack_siblings(circles: &mut [Circle], rng: &mut Lcg) -> f64 {
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

    let mut chain = FrontChain::with_capacity(n * 2);
    let mut a = chain.push(0);
    let mut b = chain.push(1);
    let c = chain.push(2);
    chain.link(a, b);
    chain.link(b, c);
    chain.link(c, a);

    let mut i = 3;
    'pack: while i < n {
        let ca = circles[chain.circle[a]];
        let cb = circles[chain.circle[b]];
        place(ca, cb, &mut circles[i]);
        let candidate = circles[i];

        // Closest intersecting circle on the front chain, measured along the chain.
        let mut j = chain.next[b];
        let mut k = chain.prev[a];
        let mut sj = cb.r;
        let mut sk = ca.r;
        loop {
            if sj <= sk {
                let cj = circles[chain.circle[j]];
                if intersects(&cj, &candidate) {
                    b = j;
                    chain.link(a, b);
                    continue 'pack;
                }
                sj += cj.r;
                j = chain.next[j];
            } else {
                let ck = circles[chain.circle[k]];
                if intersects(&ck, &candidate) {
                    a = k;
                    chain.link(a, b);
                    continue 'pack;
                }
                sk += ck.r;
                k = chain.prev[k];
            }
            if j == chain.next[k] {
                break;
            }
        }

        let c = chain.push(i);
        chain.link(a, c);
        chain.link(c, b);
        b = c;

        let mut best = chain.score(circles, a);
        let mut cursor = chain.next[c];
        while cursor != b {
            let score = chain.score(circles, cursor);
            if score < best {
                a = cursor;
                best = score;
            }
            cursor = chain.next[cursor];
        }
        b = chain.next[a];
        i += 1;
    }

    let mut front = vec![circles[chain.circle[b]]];
    let mut cursor = chain.next[b];
    while cursor != b {
        front.push(circles[chain.circle[cursor]]);
        cursor = chain.next[cursor];
    }
    let enclosing = enclose(&front, rng);

    for circle in circles.iter_mut() {
        circle.x -= enclosing.x;
        circle.y -= enclosing.y;
    }
    enclosing.r
}
