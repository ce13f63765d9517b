//! Scripted in-memory transport for unit tests

use std::{cell::Cell, collections::VecDeque, rc::Rc};

use crate::{
    MbootError, Transport,
    command::ResponseTag,
    packet::{Header, Response},
    report::{HidReport, ReportId, decode_report, encode_report},
};

type Responder = Box<dyn FnMut(&Response) -> Vec<Vec<u8>>>;
type AcceptPolicy = Box<dyn FnMut(&[u8]) -> usize>;

pub(crate) struct MockTransport {
    frame_size: usize,
    reads: VecDeque<Vec<u8>>,
    pub writes: Vec<Vec<u8>>,
    responder: Option<Responder>,
    accept: Option<AcceptPolicy>,
    closed: Rc<Cell<bool>>,
}

impl MockTransport {
    pub fn new(frame_size: usize) -> Self {
        MockTransport {
            frame_size,
            reads: VecDeque::new(),
            writes: Vec::new(),
            responder: None,
            accept: None,
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// Queue a frame to be returned by the next unanswered read
    pub fn push_read(&mut self, frame: Vec<u8>) -> &mut Self {
        self.reads.push_back(frame);
        self
    }

    /// Answer every command frame with the frames built by `responder`.
    /// The command is handed over decoded as a header and parameter list.
    pub fn with_responder(
        mut self,
        responder: impl FnMut(&Response) -> Vec<Vec<u8>> + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Override how many frame bytes each write accepts
    pub fn with_accept(mut self, accept: impl FnMut(&[u8]) -> usize + 'static) -> Self {
        self.accept = Some(Box::new(accept));
        self
    }

    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        self.closed.clone()
    }

    pub fn reports_written(&self) -> Vec<HidReport> {
        self.writes
            .iter()
            .map(|frame| decode_report(frame).unwrap())
            .collect()
    }

    pub fn command_in(&self, tag: ResponseTag, params: &[u32]) -> Vec<u8> {
        command_in(self.frame_size, tag, params)
    }

    pub fn data_in(&self, payload: &[u8]) -> Vec<u8> {
        encode_report(ReportId::DataIn, payload, self.frame_size)
    }
}

pub(crate) fn command_in(frame_size: usize, tag: ResponseTag, params: &[u32]) -> Vec<u8> {
    let res = Response::new(
        Header::new(u32::from(tag) as u8, 0, params.len() as u8),
        params.to_vec(),
    );
    encode_report(ReportId::CommandIn, &res.to_bytes(), frame_size)
}

impl Transport for MockTransport {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize, MbootError> {
        assert_eq!(frame.len(), self.frame_size);
        self.writes.push(frame.to_vec());
        let report = decode_report(frame)?;
        if report.id == ReportId::CommandOut {
            if let Some(responder) = self.responder.as_mut() {
                let cmd = Response::from_bytes(&report.payload);
                self.reads.extend(responder(&cmd));
            }
        }
        Ok(match self.accept.as_mut() {
            Some(accept) => accept(frame),
            None => frame.len(),
        })
    }

    fn read(&mut self) -> Result<Vec<u8>, MbootError> {
        self.reads.pop_front().ok_or(MbootError::Timeout)
    }

    fn close(self) -> Result<(), MbootError> {
        self.closed.set(true);
        Ok(())
    }
}
