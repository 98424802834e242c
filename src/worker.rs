//! The viewport cache with generation moved to a background thread.
//!
//! The owner thread keeps drawing whatever entry is currently
//! published while the worker builds the next one into buffers of its
//! own.  Requests are numbered; the worker skips straight to the newest
//! request waiting in its queue, and the owner only publishes a result
//! whose number matches the newest request it sent.  Anything older is
//! dropped, never merged.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use cache::{CacheEntry, Request, UpdateStatus};
use color::{ColorLut, Coloring};
use config::Config;
use errors::{Error, Result};
use escape::Variant;
use palette::{BuiltinPalettes, PaletteProvider};
use planes::{Parameters, ViewWindow};
use transform::{RenderPlan, Surface};

struct Job {
    seq: u64,
    request: Request,
    lut: Arc<ColorLut>,
    coloring: Coloring,
    threads: usize,
}

struct Finished {
    seq: u64,
    entry: CacheEntry,
}

fn run(jobs: Receiver<Job>, results: Sender<Finished>) {
    while let Ok(mut job) = jobs.recv() {
        for newer in jobs.try_iter() {
            trace!("skipping request {} for {}", job.seq, newer.seq);
            job = newer;
        }
        let entry = CacheEntry::generate(job.request, &job.lut, job.coloring, job.threads);
        if results.send(Finished { seq: job.seq, entry }).is_err() {
            break;
        }
    }
}

/// A viewport cache whose kernel runs on a background thread.  Same
/// closeness rules as `ViewCache`, but `request` returns immediately and
/// the new bitmap shows up on a later `poll`.
pub struct AsyncCache<P = BuiltinPalettes> {
    provider: P,
    palette: String,
    coloring: Coloring,
    epsilon: f64,
    threads: usize,
    lut: Option<Arc<ColorLut>>,
    jobs: Option<Sender<Job>>,
    results: Receiver<Finished>,
    handle: Option<JoinHandle<()>>,
    latest: Option<(u64, Request)>,
    published: Option<CacheEntry>,
    published_seq: u64,
    dropped: u64,
}

impl AsyncCache<BuiltinPalettes> {
    /// Starts the worker thread with the built-in palettes.
    pub fn new(config: &Config) -> Result<AsyncCache<BuiltinPalettes>> {
        AsyncCache::with_provider(config, BuiltinPalettes)
    }
}

impl<P: PaletteProvider> AsyncCache<P> {
    /// Starts the worker thread.
    pub fn with_provider(config: &Config, provider: P) -> Result<AsyncCache<P>> {
        let (job_tx, job_rx) = channel::unbounded();
        let (result_tx, result_rx) = channel::unbounded();
        let handle = thread::Builder::new()
            .name("mandelview-generator".to_string())
            .spawn(move || run(job_rx, result_tx))?;
        Ok(AsyncCache {
            provider,
            palette: config.palette.clone(),
            coloring: config.coloring,
            epsilon: config.epsilon,
            threads: config.threads,
            lut: None,
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
            latest: None,
            published: None,
            published_seq: 0,
            dropped: 0,
        })
    }

    /// Asks for a bitmap of the given view.  Nothing is sent if the
    /// newest request (pending or published) is close enough, unless
    /// `force` is set.  Invalid views and unknown palettes are rejected
    /// before anything is sent.
    pub fn request(
        &mut self,
        view: ViewWindow,
        variant: Variant,
        params: Parameters,
        force: bool,
    ) -> Result<UpdateStatus> {
        if let Err(err) = view.validate() {
            warn!("rejecting request: {}", err);
            return Err(err);
        }
        if params.grid_size.is_empty() {
            debug!("empty grid {:?} requested, keeping the current bitmap", params.grid_size);
            return Ok(UpdateStatus::EmptyGrid);
        }
        let request = Request::new(view, variant, params);
        if !force {
            if let Some((_, ref latest)) = self.latest {
                if latest.is_close_to(&request, self.epsilon) {
                    return Ok(UpdateStatus::Unchanged);
                }
            }
        }

        let lut = match self.lut {
            Some(ref lut) if lut.matches(&self.palette, params.max_iterations) => lut.clone(),
            _ => match ColorLut::build(&self.provider, &self.palette, params.max_iterations) {
                Ok(lut) => Arc::new(lut),
                Err(err) => {
                    warn!("rejecting request: {}", err);
                    return Err(err);
                }
            },
        };
        self.lut = Some(lut.clone());

        let seq = self.latest.map_or(1, |(seq, _)| seq + 1);
        let job = Job {
            seq,
            request,
            lut,
            coloring: self.coloring,
            threads: self.threads,
        };
        match self.jobs {
            Some(ref jobs) => jobs.send(job).map_err(|_| Error::WorkerGone)?,
            None => return Err(Error::WorkerGone),
        }
        self.latest = Some((seq, request));
        debug!("scheduled request {} for {:?}", seq, view);
        Ok(UpdateStatus::Scheduled)
    }

    fn accept(&mut self, finished: Finished) -> bool {
        match self.latest {
            Some((seq, _)) if seq == finished.seq => {
                debug!("publishing request {}", seq);
                self.published = Some(finished.entry);
                self.published_seq = seq;
                true
            }
            _ => {
                debug!("dropping stale result {}", finished.seq);
                self.dropped += 1;
                false
            }
        }
    }

    /// Publishes the newest finished result, if one has arrived.
    /// Returns whether the published entry changed.
    pub fn poll(&mut self) -> bool {
        let arrived: Vec<Finished> = self.results.try_iter().collect();
        let mut changed = false;
        for finished in arrived {
            changed |= self.accept(finished);
        }
        changed
    }

    /// Blocks until the newest request has been published.  Returns
    /// immediately if it already has been, or if nothing was requested.
    pub fn wait(&mut self) -> Result<()> {
        while !self.is_current() {
            let finished = self.results.recv().map_err(|_| Error::WorkerGone)?;
            self.accept(finished);
        }
        Ok(())
    }

    /// True when the published entry answers the newest request.
    pub fn is_current(&self) -> bool {
        self.latest.map_or(true, |(seq, _)| seq == self.published_seq)
    }

    /// Draws the published bitmap, however stale.  Does nothing until
    /// the first result has been published.
    pub fn render<S>(&mut self, target: &mut S, live: &ViewWindow) -> Option<RenderPlan>
    where
        S: Surface + ?Sized,
    {
        match self.published {
            Some(ref mut entry) => entry.render(target, live),
            None => None,
        }
    }

    /// Switches palettes and asks again for the newest view in the new
    /// colors.  Fails, changing nothing, if the provider does not know
    /// the name.
    pub fn set_palette(&mut self, palette: &str) -> Result<()> {
        ColorLut::build(&self.provider, palette, 0)?;
        self.palette = palette.to_string();
        if let Some((_, latest)) = self.latest {
            self.request(latest.view, latest.variant, latest.params, true)?;
        }
        Ok(())
    }

    /// The palette requests are colored with.
    pub fn palette(&self) -> &str {
        &self.palette
    }

    /// The published entry, if any.
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.published.as_ref()
    }

    /// How many finished results were thrown away for being stale.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<P> Drop for AsyncCache<P> {
    fn drop(&mut self) {
        // Closing the queue ends the worker's loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("the generation worker panicked");
            }
        }
    }
}
