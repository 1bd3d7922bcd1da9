//! 평면 링(폴리곤 외곽선)의 면적과 중심점.

/// 링이 닫혀 있지 않으면 시작점을 끝에 붙인다.
pub fn close_ring(ring: &mut Vec<(f64, f64)>) {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
}

/// 닫힌 링의 면적 (shoelace, 절대값) [m^2].
pub fn ring_area(ring: &[(f64, f64)]) -> f64 {
    signed_area(ring).abs()
}

/// 면적 가중 중심점. 퇴화된 링(면적 0)은 꼭짓점 평균으로 대신한다.
pub fn ring_centroid(ring: &[(f64, f64)]) -> (f64, f64) {
    let area = signed_area(ring);
    if area.abs() < f64::EPSILON {
        return vertex_mean(ring);
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for pair in ring.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    (cx / (6.0 * area), cy / (6.0 * area))
}

fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

fn vertex_mean(ring: &[(f64, f64)]) -> (f64, f64) {
    if ring.is_empty() {
        return (0.0, 0.0);
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}
