/// Radix sort for u32 column indices paired with their values (SoA).
/// - Sorts by inds ascending
/// - Reorders vals accordingly
/// - Stable for equal keys
///
/// Complexity: 4 passes, each O(n + 256)
#[inline]
pub fn radix_sort_u32_soa<N: Copy + Default>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // Small rows are the common case for short texts.
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut inds_tmp = vec![0u32; n];
    let mut vals_tmp = vec![N::default(); n];

    // even pass count: each pass alternates direction, two round trips end in `inds`/`vals`
    for shift in [0u32, 8, 16, 24] {
        if shift % 16 == 0 {
            scatter_pass(inds, vals, inds_tmp.as_mut_slice(), vals_tmp.as_mut_slice(), shift);
        } else {
            scatter_pass(inds_tmp.as_slice(), vals_tmp.as_slice(), inds, vals, shift);
        }
    }
}

#[inline]
fn scatter_pass<N: Copy>(src_i: &[u32], src_v: &[N], dst_i: &mut [u32], dst_v: &mut [N], shift: u32) {
    let mut count = [0usize; 256];
    for &k in src_i {
        count[((k >> shift) & 0xFF) as usize] += 1;
    }

    // prefix sum -> starting positions
    let mut sum = 0usize;
    for c in count.iter_mut() {
        let tmp = *c;
        *c = sum;
        sum += tmp;
    }

    for (&k, &v) in src_i.iter().zip(src_v) {
        let b = ((k >> shift) & 0xFF) as usize;
        let pos = count[b];
        count[b] = pos + 1;
        dst_i[pos] = k;
        dst_v[pos] = v;
    }
}

/// Tiny insertion sort for small n (SoA).
#[inline]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}
