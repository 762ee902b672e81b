#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    table: RouteTable,
    probes: &'static [Probe],
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, table: RouteTable, probes: &'static [Probe]) -> Self {
        Self { name, group, table, probes }
    }

    pub fn small(name: &'static str, table: RouteTable, probes: &'static [Probe]) -> Self {
        Self::new(name, TestGroup::Small, table, probes)
    }

    pub fn large(name: &'static str, table: RouteTable, probes: &'static [Probe]) -> Self {
        Self::new(name, TestGroup::Large, table, probes)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn probes(&self) -> &'static [Probe] {
        self.probes
    }
}

/// A route file embedded in the benchmark binary
#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    file_name: &'static str,
    content: &'static str,
}

impl RouteTable {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// A request line to look up, `method` is `None` to ignore route methods
#[derive(Debug, Copy, Clone)]
pub struct Probe {
    pub method: Option<&'static str>,
    pub path: &'static str,
}

impl Probe {
    pub const fn new(method: &'static str, path: &'static str) -> Self {
        Self { method: Some(method), path }
    }

    pub const fn any(path: &'static str) -> Self {
        Self { method: None, path }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}
