use rand::Rng;
use std::fs::File;
use std::io::Write;

/// Writes a random pin-list benchmark. Every net gets one driver and
/// between one and `max_users` users, uniformly over the grid.
pub fn generate_random_pins(
    filename: &str,
    num_nets: usize,
    max_users: usize,
    grid_w: i16,
    grid_h: i16,
) -> std::io::Result<()> {
    let mut file = File::create(filename)?;
    let mut rng = rand::thread_rng();

    log::info!(
        "Generating Benchmark: {} nets on a {}x{} grid",
        num_nets,
        grid_w,
        grid_h
    );

    writeln!(
        file,
        "# random benchmark: {} nets, up to {} users each",
        num_nets, max_users
    )?;
    for i in 0..num_nets {
        writeln!(file, "net n{}", i)?;
        writeln!(
            file,
            "  driver {} {}",
            rng.gen_range(0..grid_w),
            rng.gen_range(0..grid_h)
        )?;
        let users = rng.gen_range(1..=max_users.max(1));
        for _ in 0..users {
            writeln!(
                file,
                "  user {} {}",
                rng.gen_range(0..grid_w),
                rng.gen_range(0..grid_h)
            )?;
        }
    }
    Ok(())
}
