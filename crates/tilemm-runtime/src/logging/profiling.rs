use core::{fmt::Display, time::Duration};
use hashbrown::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Profiled {
    durations: HashMap<String, ProfileItem>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ProfileItem {
    total_duration: Duration,
    num_computed: usize,
}

impl Profiled {
    /// If some kernel was profiled.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Total number of kernels profiled.
    pub fn num_computed(&self) -> usize {
        self.durations.values().map(|item| item.num_computed).sum()
    }

    pub fn update(&mut self, name: &str, duration: Duration) {
        match self.durations.get_mut(name) {
            Some(item) => item.update(duration),
            None => {
                self.durations.insert(
                    name.to_string(),
                    ProfileItem {
                        total_duration: duration,
                        num_computed: 1,
                    },
                );
            }
        }
    }
}

impl ProfileItem {
    fn update(&mut self, duration: Duration) {
        self.total_duration += duration;
        self.num_computed += 1;
    }
}

impl Display for Profiled {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let header_name = "Kernel";
        let header_num_computed = "Launches";
        let header_duration = "Duration";
        let header_ratio = "Ratio";

        let mut name_len = header_name.len();
        let mut num_computed_len = header_num_computed.len();
        let mut duration_len = header_duration.len();
        let ratio_len = header_ratio.len().max("100 %".len());

        let mut total_duration = Duration::ZERO;
        let mut total_computed = 0;

        let mut items: Vec<(&str, String, String, Duration)> = self
            .durations
            .iter()
            .map(|(name, item)| {
                let num_computed = item.num_computed.to_string();
                let duration = format!("{:?}", item.total_duration);

                name_len = name_len.max(name.len());
                num_computed_len = num_computed_len.max(num_computed.len());
                duration_len = duration_len.max(duration.len());

                total_duration += item.total_duration;
                total_computed += item.num_computed;

                (name.as_str(), num_computed, duration, item.total_duration)
            })
            .collect();

        let total_duration_fmt = format!("{total_duration:?}");
        let total_computed_fmt = total_computed.to_string();
        duration_len = duration_len.max(total_duration_fmt.len());
        num_computed_len = num_computed_len.max(total_computed_fmt.len());

        let line_length = name_len + duration_len + num_computed_len + ratio_len + 11;
        let write_line = |char: &str, f: &mut core::fmt::Formatter<'_>| {
            writeln!(f, "|{}|", char.repeat(line_length))
        };

        items.sort_by(|a, b| b.3.cmp(&a.3).then(a.0.cmp(b.0)));

        write_line("-", f)?;
        writeln!(
            f,
            "| {header_name:<name_len$} | {header_duration:<duration_len$} | {header_num_computed:<num_computed_len$} | {header_ratio:<ratio_len$} |",
        )?;
        write_line("-", f)?;

        for (name, num_computed, duration, total) in items {
            let ratio = match total_duration.as_nanos() {
                0 => 0,
                all => 100 * total.as_nanos() / all,
            };
            let ratio = format!("{ratio} %");

            writeln!(
                f,
                "| {name:<name_len$} | {duration:<duration_len$} | {num_computed:<num_computed_len$} | {ratio:<ratio_len$} |",
            )?;
        }

        write_line("-", f)?;
        writeln!(
            f,
            "| {:<name_len$} | {total_duration_fmt:<duration_len$} | {total_computed_fmt:<num_computed_len$} | {:<ratio_len$} |",
            "Total", "100 %",
        )?;
        write_line("-", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_kernel_once() {
        let mut profiled = Profiled::default();
        profiled.update("naive", Duration::from_millis(3));
        profiled.update("tiling", Duration::from_millis(1));
        profiled.update("naive", Duration::from_millis(1));

        let summary = profiled.to_string();

        assert_eq!(profiled.num_computed(), 3);
        assert_eq!(summary.matches("naive").count(), 1);
        assert!(summary.contains("| Total"));
        assert!(summary.contains("80 %"));
    }
}
