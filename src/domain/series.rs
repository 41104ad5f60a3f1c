// Bounded chart history buffers
use std::collections::VecDeque;

/// Fixed-capacity, insertion-ordered buffer. Pushing beyond capacity evicts
/// from the front until the length is back at capacity.
#[derive(Debug)]
pub struct SlidingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> SlidingWindow<T> {
    /// Owned copy of the current contents, oldest first. Handing out owned
    /// data keeps history immutable for readers.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// The three chart series, kept in lockstep: exactly one push (and one
/// eviction) per reading, so their lengths can never diverge.
#[derive(Debug)]
pub struct TrendSeries {
    labels: SlidingWindow<String>,
    temperatures: SlidingWindow<Option<f64>>,
    humidities: SlidingWindow<Option<f64>>,
}

impl TrendSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            labels: SlidingWindow::new(capacity),
            temperatures: SlidingWindow::new(capacity),
            humidities: SlidingWindow::new(capacity),
        }
    }

    pub fn push(&mut self, label: String, temperature: Option<f64>, humidity: Option<f64>) {
        self.labels.push(label);
        self.temperatures.push(temperature);
        self.humidities.push(humidity);
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.temperatures.clear();
        self.humidities.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.snapshot()
    }

    pub fn temperatures(&self) -> Vec<Option<f64>> {
        self.temperatures.snapshot()
    }

    pub fn humidities(&self) -> Vec<Option<f64>> {
        self.humidities.snapshot()
    }
}
