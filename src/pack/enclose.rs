use super::Circle;

/// Linear congruential generator used to shuffle enclosure candidates.
/// Seeded identically for every layout so results are reproducible.
pub(super) struct Lcg {
    state: u64,
}

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub(super) fn new() -> Self {
        Self { state: 1 }
    }

    fn next_unit(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        let mut remaining = items.len();
        while remaining > 0 {
            let pick = (self.next_unit() * remaining as f64) as usize;
            remaining -= 1;
            items.swap(remaining, pick.min(remaining));
        }
    }
}

/// Smallest circle enclosing every circle in `circles` (Welzl-style
/// move-to-front with an explicit basis of at most three circles).
pub(super) fn enclose(circles: &[Circle], random: &mut Lcg) -> Circle {
    let mut shuffled = circles.to_vec();
    random.shuffle(&mut shuffled);

    let mut basis: Vec<Circle> = Vec::new();
    let mut enclosing: Option<Circle> = None;
    let mut index = 0usize;

    while index < shuffled.len() {
        let candidate = shuffled[index];
        if let Some(current) = enclosing
            && encloses_weak(current, candidate)
        {
            index += 1;
            continue;
        }

        match extend_basis(&basis, candidate) {
            Some(next_basis) => {
                basis = next_basis;
                enclosing = Some(enclose_basis(&basis));
                index = 0;
            }
            None => return bounding_fallback(&shuffled, enclosing),
        }
    }

    enclosing.unwrap_or_default()
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    for &b in basis {
        if encloses_not(p, b) && encloses_weak_all(enclose_two(b, p), basis) {
            return Some(vec![b, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (basis[i], basis[j]);
            if encloses_not(enclose_two(bi, bj), p)
                && encloses_not(enclose_two(bi, p), bj)
                && encloses_not(enclose_two(bj, p), bi)
                && encloses_weak_all(enclose_three(bi, bj, p), basis)
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }

    None
}

/// Numerical dead end: a circle around the current centre that reaches every input.
fn bounding_fallback(circles: &[Circle], current: Option<Circle>) -> Circle {
    let (x, y) = current.map(|c| (c.x, c.y)).unwrap_or((0.0, 0.0));
    let r = circles
        .iter()
        .map(|c| (c.x - x).hypot(c.y - y) + c.r)
        .fold(0.0_f64, f64::max);
    Circle { x, y, r }
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_two(*a, *b),
        [a, b, c] => enclose_three(*a, *b, *c),
        _ => Circle::default(),
    }
}

fn enclose_two(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l <= f64::EPSILON {
        return if a.r >= b.r { a } else { b };
    }

    Circle {
        x: (a.x + b.x + x21 / l * r21) / 2.0,
        y: (a.y + b.y + y21 / l * r21) / 2.0,
        r: (l + a.r + b.r) / 2.0,
    }
}

fn enclose_three(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);

    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });

    Circle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    }
}
